//! LRCX reader. LRCX extends LRC with `[tt]` timing tracks and `[tr:<lang>]`
//! translation lines that share the timestamp of the original lyric.

use super::tokenize_line;
use crate::error::{Error, Result};
use crate::script::has_korean_or_kana;
use crate::srt::Cue;
use crate::timecode::to_millis;
use serde::Deserialize;
use std::collections::HashSet;
use std::str::FromStr;
use tracing::{debug, trace};

/// Space left between a cue's end and the next cue's start.
pub const GUARD_GAP: f64 = 0.1;
/// Duration of a cue with no following line.
pub const DEFAULT_DURATION: f64 = 3.0;
/// Shortest cue produced when the next line starts too close.
const MIN_DURATION: f64 = 0.1;

/// Which of the interleaved original/translation lines to keep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LrcxMode {
    /// Only the original lyric lines.
    Original,
    /// Original lines, with translations filling in where no usable original exists.
    #[default]
    Intelligent,
    /// Only translation lines, one per timestamp.
    TranslationOnly,
}

impl FromStr for LrcxMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "original" => Ok(Self::Original),
            "intelligent" => Ok(Self::Intelligent),
            "translation-only" => Ok(Self::TranslationOnly),
            other => Err(Error::Validation(format!("unknown LRCX mode `{other}`"))),
        }
    }
}

/// A line that survived mode filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct KeptLine {
    pub stamps: Vec<f64>,
    pub text: String,
}

/// Apply the mode policy to every line, in file order.
///
/// Lines are compared by their first timestamp. In intelligent mode a translation
/// is kept only while no original line has been kept for its timestamp, and
/// original lines in Korean or kana script are dropped so their translation can
/// take their place.
pub fn filter_lines(input: &str, mode: LrcxMode) -> Vec<KeptLine> {
    let mut original_seen: HashSet<u64> = HashSet::new();
    let mut translation_seen: HashSet<u64> = HashSet::new();
    let mut kept = Vec::new();
    for line in input.lines() {
        let tok = tokenize_line(line);
        if tok.timing_track {
            continue;
        }
        let Some(&first) = tok.stamps.first() else {
            continue;
        };
        let key = to_millis(first);
        let is_translation = tok.translation.is_some();
        let keep = match mode {
            LrcxMode::Original => !is_translation,
            LrcxMode::TranslationOnly => is_translation && translation_seen.insert(key),
            LrcxMode::Intelligent if is_translation => {
                !original_seen.contains(&key) && translation_seen.insert(key)
            }
            LrcxMode::Intelligent => {
                if has_korean_or_kana(tok.text) {
                    false
                } else {
                    original_seen.insert(key);
                    true
                }
            }
        };
        if keep && !tok.text.is_empty() {
            kept.push(KeptLine {
                stamps: tok.stamps,
                text: tok.text.to_string(),
            });
        }
    }
    kept
}

/// Parse LRCX text into cues using `mode`.
pub fn parse(input: &str, mode: LrcxMode) -> Result<Vec<Cue>> {
    trace!("lrcx::parse(len={}, mode={:?})", input.len(), mode);
    let mut timed: Vec<(f64, String)> = filter_lines(input, mode)
        .into_iter()
        .flat_map(|line| {
            let text = line.text;
            line.stamps.into_iter().map(move |s| (s, text.clone()))
        })
        .collect();
    timed.sort_by(|a, b| a.0.total_cmp(&b.0));
    let cues: Vec<Cue> = timed
        .iter()
        .enumerate()
        .map(|(i, (start, text))| {
            let end = match timed.get(i + 1) {
                Some((next, _)) => (next - GUARD_GAP).max(start + MIN_DURATION),
                None => start + DEFAULT_DURATION,
            };
            Cue::new(i as u32 + 1, *start, end, text.clone())
        })
        .collect();
    debug!("parsed {} LRCX cues", cues.len());
    Ok(cues)
}
