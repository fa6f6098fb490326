//! LRC lyric reader and the line tokenizer shared with LRCX.

pub mod lrcx;

use crate::error::Result;
use crate::srt::Cue;
use crate::timecode::{parse_timecode, TimecodeFormat};
use tracing::{debug, trace};

/// Display time of the final LRC line.
pub const LAST_LINE_DURATION: f64 = 2.0;

/// A lyric line split into its leading bracket groups and its text.
#[derive(Debug, Clone, PartialEq)]
pub struct LrcLine<'a> {
    /// Leading timestamps in seconds, in file order.
    pub stamps: Vec<f64>,
    /// The line carries a `[tt]` per-character timing track.
    pub timing_track: bool,
    /// Language of a `[tr:<lang>]` translation tag.
    pub translation: Option<&'a str>,
    pub text: &'a str,
}

/// Split `line` into leading timestamps, `[tt]`/`[tr:…]` tags and trailing text.
///
/// Scanning stops at the first bracket group that is none of those, so lyrics
/// such as `[Chorus]` stay part of the text.
pub fn tokenize_line(line: &str) -> LrcLine<'_> {
    let mut out = LrcLine {
        stamps: Vec::new(),
        timing_track: false,
        translation: None,
        text: "",
    };
    let mut rest = line.trim();
    while let Some(inner) = rest.strip_prefix('[') {
        let Some(close) = inner.find(']') else { break };
        let group = &inner[..close];
        if let Ok(secs) = parse_timecode(group, TimecodeFormat::Lrc) {
            out.stamps.push(secs);
        } else if group == "tt" {
            out.timing_track = true;
        } else if let Some(lang) = group.strip_prefix("tr:") {
            out.translation = Some(lang);
        } else {
            break;
        }
        rest = &inner[close + 1..];
    }
    out.text = rest.trim();
    out
}

/// Parse LRC text into cues. Each timestamp of a line with text becomes one cue
/// ending where the next cue starts; the last cue lasts [`LAST_LINE_DURATION`].
pub fn parse(input: &str) -> Result<Vec<Cue>> {
    trace!("lrc::parse(len={})", input.len());
    let mut timed: Vec<(f64, String)> = Vec::new();
    for line in input.lines() {
        let tok = tokenize_line(line);
        if tok.timing_track || tok.text.is_empty() {
            continue;
        }
        for &start in &tok.stamps {
            timed.push((start, tok.text.to_string()));
        }
    }
    timed.sort_by(|a, b| a.0.total_cmp(&b.0));
    let cues: Vec<Cue> = timed
        .iter()
        .enumerate()
        .map(|(i, (start, text))| {
            let end = timed
                .get(i + 1)
                .map(|next| next.0)
                .unwrap_or(start + LAST_LINE_DURATION);
            Cue::new(i as u32 + 1, *start, end, text.clone())
        })
        .collect();
    debug!("parsed {} LRC cues", cues.len());
    Ok(cues)
}
