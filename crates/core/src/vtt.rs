//! WebVTT reader producing canonical cues.

use crate::error::Result;
use crate::srt::{parse_timing, Cue};
use crate::timecode::TimecodeFormat;
use tracing::{debug, trace, warn};

/// Blocks that carry no cue text.
const SKIPPED_BLOCKS: [&str; 4] = ["WEBVTT", "NOTE", "STYLE", "REGION"];

/// Parse VTT text into cues.
///
/// The header and `NOTE`/`STYLE`/`REGION` blocks are dropped up to the first
/// timing line. Every line containing
/// `-->` opens a cue whose text runs until the next blank line.
pub fn parse(input: &str) -> Result<Vec<Cue>> {
    trace!("vtt::parse(len={})", input.len());
    let mut cues = Vec::new();
    let mut lines = input.trim_start_matches('\u{feff}').lines().peekable();
    let mut at_block_start = true;
    while let Some(raw) = lines.next() {
        let line = raw.trim();
        if line.is_empty() {
            at_block_start = true;
            continue;
        }
        if at_block_start && SKIPPED_BLOCKS.iter().any(|k| line.starts_with(k)) {
            // Skip to the end of the block, or to a cue that follows without a blank line.
            while lines.peek().is_some_and(|l| !l.trim().is_empty() && !l.contains("-->")) {
                lines.next();
            }
            continue;
        }
        at_block_start = false;
        if !line.contains("-->") {
            // Cue identifier or stray text.
            continue;
        }
        let mut text = Vec::new();
        while let Some(next) = lines.peek() {
            if next.trim().is_empty() {
                break;
            }
            text.push(next.trim());
            lines.next();
        }
        match parse_timing(line, TimecodeFormat::Vtt) {
            Ok((start, end)) => {
                cues.push(Cue::new(cues.len() as u32 + 1, start, end, text.join("\n")));
            }
            Err(err) => warn!("skipping VTT cue: {err}"),
        }
    }
    debug!("parsed {} VTT cues", cues.len());
    Ok(cues)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::srt;

    #[test]
    fn converts_to_srt() {
        let input = "WEBVTT\n\nNOTE a comment\nspanning lines\n\nintro\n00:00:01.000 --> 00:00:02.500 align:start\nHello. Mr. Smith\n\n00:03.000 --> 00:04.000\nBye\n";
        let cues = parse(input).unwrap();
        assert_eq!(cues.len(), 2);
        assert_eq!(
            srt::format(&cues),
            "1\n00:00:01,000 --> 00:00:02,500\nHello. Mr. Smith\n\n2\n00:00:03,000 --> 00:00:04,000\nBye\n\n"
        );
    }

    /// Ensure a cue directly under the header is kept.
    #[test]
    fn cue_right_after_header() {
        let input = "WEBVTT\n00:00:01.000 --> 00:00:02.000\nHello\n\n00:00:03.000 --> 00:00:04.000\nBye\n";
        let cues = parse(input).unwrap();
        let texts: Vec<&str> = cues.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["Hello", "Bye"]);
        assert_eq!(cues[1].index, 2);
    }

    #[test]
    fn empty_document_has_no_cues() {
        assert!(parse("WEBVTT\n\n").unwrap().is_empty());
    }
}
