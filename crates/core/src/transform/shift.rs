//! Constant time offset for SRT timing.

use crate::error::{Error, Result};
use crate::srt::{format_timing, parse_timing, Cue};
use crate::timecode::TimecodeFormat;
use tracing::{debug, trace, warn};

/// Shortest display time guaranteed to a cue whose start was clamped at zero.
pub const MIN_VISIBLE: f64 = 0.1;

/// Parse a user supplied offset in seconds.
pub fn parse_offset(text: &str) -> Result<f64> {
    match text.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(Error::Validation(format!("time offset `{}` is not a number", text.trim()))),
    }
}

/// Shift one timing pair, clamping the start at zero.
fn shift_pair(start: f64, end: f64, offset: f64) -> (f64, f64) {
    let start = start + offset;
    let end = end + offset;
    if start < 0.0 {
        (0.0, end.max(MIN_VISIBLE))
    } else {
        (start, end)
    }
}

/// Shift every timing line of `input` by `offset` seconds.
///
/// Lines without `-->`, and timing lines that fail to parse, are copied unchanged.
pub fn shift_srt(input: &str, offset: f64) -> Result<String> {
    trace!("shift_srt(len={}, offset={})", input.len(), offset);
    if !offset.is_finite() {
        return Err(Error::Validation("time offset must be finite".into()));
    }
    let mut out = String::with_capacity(input.len());
    let mut shifted = 0usize;
    for raw in input.split_inclusive('\n') {
        // Keep each line's own ending so CRLF files stay CRLF.
        let body = raw.trim_end_matches(['\r', '\n']);
        let ending = &raw[body.len()..];
        if !body.contains("-->") {
            out.push_str(raw);
            continue;
        }
        match parse_timing(body, TimecodeFormat::Srt) {
            Ok((start, end)) => {
                let (start, end) = shift_pair(start, end, offset);
                out.push_str(&format_timing(start, end));
                out.push_str(ending);
                shifted += 1;
            }
            Err(err) => {
                warn!("leaving timing line untouched: {err}");
                out.push_str(raw);
            }
        }
    }
    debug!("shifted {shifted} timing lines");
    Ok(out)
}

/// Shift parsed cues by `offset` seconds.
pub fn shift_cues(cues: &[Cue], offset: f64) -> Vec<Cue> {
    cues.iter()
        .map(|cue| {
            let (start, end) = shift_pair(cue.start, cue.end, offset);
            Cue { start, end, ..cue.clone() }
        })
        .collect()
}
