//! Tools for cleaning up subtitle files and getting them into some
//! kind of normalized format.

use crate::error::{Error, Result};
use crate::srt::{self, renumber, Cue};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Deserialize;
use tracing::{debug, trace};

/// Which cleaning passes to run. Every pass is off by default.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CleanOptions {
    pub remove_empty: bool,
    /// Cues shorter than this many seconds are dropped. Zero disables the check.
    pub min_duration: f64,
    pub remove_sound_effects: bool,
    pub remove_speakers: bool,
    pub remove_formatting: bool,
    pub fix_capitalization: bool,
    pub remove_duplicates: bool,
    pub make_continuous: bool,
    pub fix_timing: bool,
}

// [MUSIC], (laughing)
static SOUND_BRACKETS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[^\]\n]*\]").unwrap());
static SOUND_PARENS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\([^)\n]*\)").unwrap());

// JOHN: / [SPEAKER 1]: at the start of a line.
static SPEAKER_CAPS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[A-Z][A-Z ]*:[ \t]*").unwrap());
static SPEAKER_BRACKET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\[[^\]\n]*\]:[ \t]*").unwrap());

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());
static ENTITY: Lazy<Regex> = Lazy::new(|| Regex::new(r"&([a-zA-Z0-9#]+);").unwrap());

static CAPS_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[A-Z]{5,}\b").unwrap());

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Minimum length kept when resolving an overlap.
const OVERLAP_MIN_DURATION: f64 = 0.5;
/// Gap left before the next cue when resolving an overlap.
const OVERLAP_GAP: f64 = 0.1;

fn decode_entity(caps: &Captures) -> String {
    let name = &caps[1];
    let decoded = match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => name
            .strip_prefix("#x")
            .or_else(|| name.strip_prefix("#X"))
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .or_else(|| name.strip_prefix('#').and_then(|dec| dec.parse().ok()))
            .and_then(char::from_u32),
    };
    decoded.unwrap_or(' ').to_string()
}

/// Clean up a single cue's text, or return `None` if nothing is left.
fn clean_text(text: &str, opts: &CleanOptions) -> Option<String> {
    let mut text = text.to_string();
    if opts.remove_sound_effects {
        text = SOUND_BRACKETS.replace_all(&text, "").into_owned();
        text = SOUND_PARENS.replace_all(&text, "").into_owned();
    }
    if opts.remove_speakers {
        text = SPEAKER_CAPS.replace_all(&text, "").into_owned();
        text = SPEAKER_BRACKET.replace_all(&text, "").into_owned();
    }
    if opts.remove_formatting {
        text = TAG.replace_all(&text, "").into_owned();
        text = ENTITY.replace_all(&text, decode_entity).into_owned();
    }
    if opts.fix_capitalization {
        text = CAPS_WORD
            .replace_all(&text, |caps: &Captures| {
                let word = &caps[0];
                format!("{}{}", &word[..1], word[1..].to_lowercase())
            })
            .into_owned();
    }
    let text = WHITESPACE.replace_all(&text, " ").trim().to_string();
    (!text.is_empty()).then_some(text)
}

/// Clean up cues according to `opts` and renumber the survivors.
pub fn clean_cues(cues: &[Cue], opts: &CleanOptions) -> Result<Vec<Cue>> {
    trace!("clean_cues(count={}, opts={:?})", cues.len(), opts);
    if !opts.min_duration.is_finite() || opts.min_duration < 0.0 {
        return Err(Error::Validation(format!(
            "minimum duration must be a non-negative number, got {}",
            opts.min_duration
        )));
    }
    let mut out: Vec<Cue> = Vec::with_capacity(cues.len());
    for cue in cues {
        if opts.remove_empty && cue.text.trim().is_empty() {
            continue;
        }
        if opts.min_duration > 0.0 && cue.duration() < opts.min_duration {
            continue;
        }
        let Some(text) = clean_text(&cue.text, opts) else {
            continue;
        };
        if opts.remove_duplicates {
            if let Some(prev) = out.last_mut().filter(|p| p.text == text) {
                prev.end = prev.end.max(cue.end);
                continue;
            }
        }
        out.push(Cue { text, ..cue.clone() });
    }

    if opts.make_continuous {
        for i in 1..out.len() {
            out[i - 1].end = out[i].start;
        }
    }

    // Fix overlaps.
    if opts.fix_timing {
        for i in 1..out.len() {
            let next_start = out[i].start;
            let current = &mut out[i - 1];
            if current.end > next_start {
                current.end =
                    (current.start + OVERLAP_MIN_DURATION).max(next_start - OVERLAP_GAP);
            }
        }
    }

    renumber(&mut out);
    debug!("kept {} of {} cues", out.len(), cues.len());
    Ok(out)
}

/// Parse, clean and re-serialize SRT text.
pub fn clean_srt(input: &str, opts: &CleanOptions) -> Result<String> {
    let cues = srt::parse(input)?;
    Ok(srt::format(&clean_cues(&cues, opts)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cue(start: f64, end: f64, text: &str) -> Cue {
        Cue::new(0, start, end, text)
    }

    #[test]
    fn strips_clutter() {
        let opts = CleanOptions {
            remove_sound_effects: true,
            remove_speakers: true,
            remove_formatting: true,
            fix_capitalization: true,
            ..Default::default()
        };
        let cues = vec![
            cue(0.0, 1.0, "JOHN: <i>Hello</i> [door slams]\nWHAT IS HAPPENING NASA"),
            cue(1.0, 2.0, "(laughing)"),
            cue(2.0, 3.0, "Tom &amp; Jerry&nbsp;&#33;&bogus;"),
        ];
        let out = clean_cues(&cues, &opts).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].text, "Hello WHAT IS Happening NASA");
        assert_eq!(out[1].text, "Tom & Jerry !");
        assert_eq!(out[1].index, 2);
    }

    #[test]
    fn removes_bracketed_speaker() {
        let opts = CleanOptions {
            remove_speakers: true,
            ..Default::default()
        };
        let out = clean_cues(&[cue(0.0, 1.0, "[Narrator]: Once upon a time")], &opts).unwrap();
        assert_eq!(out[0].text, "Once upon a time");
    }

    /// Ensure cues shorter than the minimum are dropped before cleaning.
    #[test]
    fn drops_short_and_empty() {
        let opts = CleanOptions {
            remove_empty: true,
            min_duration: 0.5,
            ..Default::default()
        };
        let cues = vec![cue(0.0, 0.2, "short"), cue(1.0, 2.0, "  "), cue(3.0, 4.0, "ok")];
        let out = clean_cues(&cues, &opts).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].text, "ok");
    }

    #[test]
    fn makes_continuous_then_fixes_overlaps() {
        let opts = CleanOptions {
            make_continuous: true,
            ..Default::default()
        };
        let out = clean_cues(&[cue(0.0, 1.0, "a"), cue(3.0, 4.0, "b")], &opts).unwrap();
        assert_eq!(out[0].end, 3.0);
        assert_eq!(out[1].end, 4.0);

        let opts = CleanOptions {
            fix_timing: true,
            ..Default::default()
        };
        let out = clean_cues(&[cue(0.0, 5.0, "a"), cue(3.0, 4.0, "b")], &opts).unwrap();
        assert!((out[0].end - 2.9).abs() < 1e-9);
        let out = clean_cues(&[cue(0.0, 5.0, "a"), cue(0.2, 4.0, "b")], &opts).unwrap();
        assert!((out[0].end - 0.5).abs() < 1e-9);
    }

    #[test]
    fn merges_consecutive_duplicates() {
        let opts = CleanOptions {
            remove_duplicates: true,
            ..Default::default()
        };
        let cues = vec![cue(0.0, 1.0, "same"), cue(1.0, 2.0, "same"), cue(2.0, 3.0, "other")];
        let out = clean_cues(&cues, &opts).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].end, 2.0);
    }

    #[test]
    fn reads_camel_case_options() {
        let opts: CleanOptions =
            serde_json::from_str(r#"{"removeEmpty":true,"minDuration":0.75}"#).unwrap();
        assert!(opts.remove_empty);
        assert_eq!(opts.min_duration, 0.75);
        assert!(!opts.fix_timing);
    }

    #[test]
    fn cleans_srt_text() {
        let input = "7\n00:00:01,000 --> 00:00:02,000\n<b>hi</b>\n\n9\n00:00:03,000 --> 00:00:04,000\n[MUSIC]\n";
        let opts = CleanOptions {
            remove_formatting: true,
            remove_sound_effects: true,
            ..Default::default()
        };
        assert_eq!(
            clean_srt(input, &opts).unwrap(),
            "1\n00:00:01,000 --> 00:00:02,000\nhi\n\n"
        );
    }
}
