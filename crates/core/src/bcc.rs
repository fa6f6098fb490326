//! Bilibili BCC (JSON) subtitle reader.

use crate::error::{Error, Result};
use crate::srt::Cue;
use serde::Deserialize;
use tracing::{debug, trace};

/// The parts of a BCC document we read. Styling fields are ignored.
#[derive(Debug, Deserialize)]
struct BccDocument {
    #[serde(default)]
    body: Vec<BccLine>,
}

#[derive(Debug, Deserialize)]
struct BccLine {
    #[serde(default)]
    from: f64,
    #[serde(default)]
    to: f64,
    #[serde(default)]
    content: String,
}

/// Parse BCC JSON into cues, skipping entries whose content is blank.
pub fn parse(input: &str) -> Result<Vec<Cue>> {
    trace!("bcc::parse(len={})", input.len());
    let doc: BccDocument = serde_json::from_str(input.trim_start_matches('\u{feff}'))
        .map_err(|e| Error::Format(format!("invalid JSON in BCC file: {e}")))?;
    if doc.body.is_empty() {
        return Err(Error::Format("no subtitle data found in BCC file".into()));
    }
    let cues: Vec<Cue> = doc
        .body
        .into_iter()
        .filter(|line| !line.content.trim().is_empty())
        .enumerate()
        .map(|(i, line)| Cue::new(i as u32 + 1, line.from, line.to, line.content.trim()))
        .collect();
    debug!("parsed {} BCC cues", cues.len());
    Ok(cues)
}
