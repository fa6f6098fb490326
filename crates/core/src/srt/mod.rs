//! This module is responsible for SRT parsing and serialization.
//! It also defines [`Cue`], the canonical entry every parser produces.

use crate::error::{Error, Result};
use crate::timecode::{format_timecode, parse_timecode, TimecodeFormat};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

/// A single timed subtitle entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cue {
    /// Display order, 1-based.
    pub index: u32,
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds.
    pub end: f64,
    /// Text, lines separated by `\n`.
    pub text: String,
}

impl Cue {
    pub fn new(index: u32, start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            index,
            start,
            end,
            text: text.into(),
        }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Renumber cues sequentially from 1.
pub fn renumber(cues: &mut [Cue]) {
    for (i, cue) in cues.iter_mut().enumerate() {
        cue.index = i as u32 + 1;
    }
}

/// Parse SRT text into cues.
///
/// Blocks are separated by blank lines. The index line is optional and a block
/// whose timing line is malformed is skipped. Non-empty input that yields no
/// cue at all is rejected.
pub fn parse(input: &str) -> Result<Vec<Cue>> {
    trace!("srt::parse(len={})", input.len());
    let input = input.trim_start_matches('\u{feff}');
    let mut cues = Vec::new();
    let mut skipped = 0usize;
    let mut block: Vec<&str> = Vec::new();
    for line in input.lines().chain(std::iter::once("")) {
        if !line.trim().is_empty() {
            block.push(line.trim_end());
            continue;
        }
        if block.is_empty() {
            continue;
        }
        for run in split_runs(&block) {
            match parse_block(&run, cues.len()) {
                Ok(Some(cue)) => cues.push(cue),
                Ok(None) => skipped += 1,
                Err(err) => {
                    warn!("skipping subtitle block: {err}");
                    skipped += 1;
                }
            }
        }
        block.clear();
    }
    if cues.is_empty() && !input.trim().is_empty() {
        return Err(Error::Format("no subtitle cues found".into()));
    }
    debug!("parsed {} cues, skipped {} blocks", cues.len(), skipped);
    Ok(cues)
}

fn is_timing(line: &str) -> bool {
    line.contains("-->") && parse_timing(line, TimecodeFormat::Srt).is_ok()
}

/// Break a blank-line separated block into one run per cue. Files often drop the
/// blank line between cues, so a second timing line starts a new run, taking
/// a bare number just above it along as the index.
fn split_runs<'a>(block: &[&'a str]) -> Vec<Vec<&'a str>> {
    let mut runs = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut timing_at: Option<usize> = None;
    for &line in block {
        if let (Some(at), true) = (timing_at, is_timing(line)) {
            let index = match current.last() {
                Some(last) if current.len() > at + 1 && is_index(last) => current.pop(),
                _ => None,
            };
            runs.push(std::mem::take(&mut current));
            current.extend(index);
            timing_at = None;
        }
        if timing_at.is_none() && line.contains("-->") {
            timing_at = Some(current.len());
        }
        current.push(line);
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

fn is_index(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty() && line.bytes().all(|b| b.is_ascii_digit())
}

fn parse_block(block: &[&str], parsed: usize) -> Result<Option<Cue>> {
    let Some(pos) = block.iter().position(|l| l.contains("-->")) else {
        return Ok(None);
    };
    let index = match pos {
        0 => parsed as u32 + 1,
        _ => block[pos - 1]
            .trim()
            .parse()
            .unwrap_or(parsed as u32 + 1),
    };
    let (start, end) = parse_timing(block[pos], TimecodeFormat::Srt)?;
    let text = block[pos + 1..]
        .iter()
        .map(|l| l.trim())
        .collect::<Vec<_>>()
        .join("\n");
    Ok(Some(Cue::new(index, start, end, text)))
}

/// Parse a timing line like `00:00:01,000 --> 00:00:02,000` into seconds.
/// Anything after the end timecode (VTT cue settings) is ignored.
pub fn parse_timing(line: &str, format: TimecodeFormat) -> Result<(f64, f64)> {
    let (start, rest) = line
        .split_once("-->")
        .ok_or_else(|| Error::parse("missing `-->`", line))?;
    let end = rest
        .split_whitespace()
        .next()
        .ok_or_else(|| Error::parse("missing end time", line))?;
    let start = parse_timecode(start, format).map_err(|_| Error::parse("bad start time", line))?;
    let end = parse_timecode(end, format).map_err(|_| Error::parse("bad end time", line))?;
    Ok((start, end))
}

/// Format a timing line in SRT notation.
pub fn format_timing(start: f64, end: f64) -> String {
    format!(
        "{} --> {}",
        format_timecode(start, TimecodeFormat::Srt),
        format_timecode(end, TimecodeFormat::Srt)
    )
}

/// Format cues back to SRT text.
/// The way this works is by writing each cue sequentially with blank lines.
pub fn format(cues: &[Cue]) -> String {
    let mut out = String::new();
    for cue in cues {
        out.push_str(&format!(
            "{}\n{}\n{}\n\n",
            cue.index,
            format_timing(cue.start, cue.end),
            cue.text
        ));
    }
    out
}
