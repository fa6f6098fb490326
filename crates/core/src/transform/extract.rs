//! Plain text extraction from subtitle-like documents.

use crate::srt::{self, format_timing};
use crate::vtt;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, trace};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExtractOptions {
    /// Prefix each passage with its `[start --> end]` timing when known.
    pub include_timestamps: bool,
    /// Prefix each passage with `N. `.
    pub add_line_numbers: bool,
    /// Separate passages with a blank line.
    pub add_blank_lines: bool,
}

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

/// A run of text lines, optionally timed.
#[derive(Debug)]
struct Passage {
    timing: Option<(f64, f64)>,
    lines: Vec<String>,
}

fn from_cues(cues: Vec<srt::Cue>, strip_tags: bool) -> Vec<Passage> {
    cues.into_iter()
        .map(|cue| Passage {
            timing: Some((cue.start, cue.end)),
            lines: cue
                .text
                .lines()
                .map(|l| match strip_tags {
                    true => TAG.replace_all(l, "").trim().to_string(),
                    false => l.to_string(),
                })
                .filter(|l| !l.is_empty())
                .collect(),
        })
        .filter(|p| !p.lines.is_empty())
        .collect()
}

/// Anything else: drop cue numbers and timing lines, split passages on blanks.
fn scan_generic(input: &str) -> Vec<Passage> {
    let mut passages = Vec::new();
    let mut lines = Vec::new();
    for line in input.lines().map(str::trim) {
        if line.is_empty() {
            if !lines.is_empty() {
                passages.push(Passage {
                    timing: None,
                    lines: std::mem::take(&mut lines),
                });
            }
            continue;
        }
        if line.contains("-->") || line.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }
        lines.push(line.to_string());
    }
    if !lines.is_empty() {
        passages.push(Passage { timing: None, lines });
    }
    passages
}

fn collect_passages(input: &str) -> Vec<Passage> {
    if let Ok(cues) = srt::parse(input) {
        if !cues.is_empty() {
            debug!("extracting from SRT");
            return from_cues(cues, false);
        }
    }
    // Headerless VTT still has `.` millisecond timings the SRT reader rejects.
    if let Ok(cues) = vtt::parse(input) {
        if !cues.is_empty() {
            debug!("extracting from VTT");
            return from_cues(cues, true);
        }
    }
    debug!("extracting from generic text");
    scan_generic(input)
}

/// Extract the text of `input`, decorated per `opts`.
pub fn extract_text(input: &str, opts: &ExtractOptions) -> String {
    trace!("extract_text(len={}, opts={:?})", input.len(), opts);
    let passages = collect_passages(input);
    let mut out: Vec<String> = Vec::new();
    for (n, passage) in passages.iter().enumerate() {
        let mut prefix = String::new();
        if opts.add_line_numbers {
            prefix.push_str(&format!("{}. ", n + 1));
        }
        if let (true, Some((start, end))) = (opts.include_timestamps, passage.timing) {
            prefix.push_str(&format!("[{}] ", format_timing(start, end)));
        }
        for (i, line) in passage.lines.iter().enumerate() {
            match i {
                0 => out.push(format!("{prefix}{line}")),
                _ => out.push(line.clone()),
            }
        }
        if opts.add_blank_lines && n + 1 < passages.len() {
            out.push(String::new());
        }
    }
    let mut text = out.join("\n");
    if !text.is_empty() {
        text.push('\n');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRT: &str = "1\n00:00:01,000 --> 00:00:02,000\nHello\nthere\n\n2\n00:00:03,000 --> 00:00:04,000\nBye\n";

    #[test]
    fn extracts_bare_text() {
        assert_eq!(extract_text(SRT, &ExtractOptions::default()), "Hello\nthere\nBye\n");
    }

    #[test]
    fn decorates_passages() {
        let opts = ExtractOptions {
            include_timestamps: true,
            add_line_numbers: true,
            add_blank_lines: true,
        };
        assert_eq!(
            extract_text(SRT, &opts),
            "1. [00:00:01,000 --> 00:00:02,000] Hello\nthere\n\n2. [00:00:03,000 --> 00:00:04,000] Bye\n"
        );
    }

    /// Ensure VTT input has its header, timing and tags stripped.
    #[test]
    fn falls_back_to_vtt() {
        let input = "WEBVTT\n\n00:01.000 --> 00:02.000\n<v Roger>Hi <b>you</b>\n";
        assert_eq!(extract_text(input, &ExtractOptions::default()), "Hi you\n");
    }

    #[test]
    fn headerless_vtt_is_still_vtt() {
        let input = "00:00:01.000 --> 00:00:02.000\n<b>Hi</b> there\n\n00:00:03.000 --> 00:00:04.000\n<i>Bye</i>\n";
        let opts = ExtractOptions {
            include_timestamps: true,
            ..Default::default()
        };
        assert_eq!(
            extract_text(input, &opts),
            "[00:00:01,000 --> 00:00:02,000] Hi there\n[00:00:03,000 --> 00:00:04,000] Bye\n"
        );
    }

    #[test]
    fn falls_back_to_generic() {
        let input = "12\nsome words\n00:01 --> 00:02\n\nmore words\n";
        let opts = ExtractOptions {
            add_line_numbers: true,
            ..Default::default()
        };
        assert_eq!(extract_text(input, &opts), "1. some words\n2. more words\n");
    }
}
