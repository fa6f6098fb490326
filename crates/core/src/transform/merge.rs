//! Concatenation of several SRT files into one timeline.

use crate::error::{Error, Result};
use crate::srt::{self, renumber, Cue};
use tracing::{debug, trace};

/// Default silence inserted between merged files, in seconds.
pub const DEFAULT_GAP: f64 = 1.0;

/// Concatenate already parsed files. Each file is offset so that it starts `gap`
/// seconds after the latest end time of the files before it.
pub fn merge_cues(files: &[Vec<Cue>], gap: f64) -> Result<Vec<Cue>> {
    trace!("merge_cues(files={}, gap={})", files.len(), gap);
    if !gap.is_finite() || gap < 0.0 {
        return Err(Error::Validation(format!(
            "gap between files must be a non-negative number, got {gap}"
        )));
    }
    let mut merged = Vec::new();
    let mut offset = 0.0;
    for (n, cues) in files.iter().enumerate() {
        // An empty file still moves the timeline on by one gap.
        let mut max_end = offset;
        for cue in cues {
            let shifted = Cue {
                start: cue.start + offset,
                end: cue.end + offset,
                ..cue.clone()
            };
            max_end = f64::max(max_end, shifted.end);
            merged.push(shifted);
        }
        debug!("file {} placed at offset {:.3}s", n + 1, offset);
        offset = max_end + gap;
    }
    renumber(&mut merged);
    Ok(merged)
}

/// Parse each SRT text, merge and serialize.
pub fn merge_srt(inputs: &[&str], gap: f64) -> Result<String> {
    let files = inputs
        .iter()
        .map(|text| srt::parse(text))
        .collect::<Result<Vec<_>>>()?;
    Ok(srt::format(&merge_cues(&files, gap)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_following_files() {
        let a = "1\n00:00:01,000 --> 00:00:03,000\na1\n\n2\n00:00:02,000 --> 00:00:05,000\na2\n";
        let b = "1\n00:00:00,500 --> 00:00:01,000\nb1\n";
        let out = merge_srt(&[a, b], 1.0).unwrap();
        assert_eq!(
            out,
            "1\n00:00:01,000 --> 00:00:03,000\na1\n\n\
             2\n00:00:02,000 --> 00:00:05,000\na2\n\n\
             3\n00:00:06,500 --> 00:00:07,000\nb1\n\n"
        );
    }

    /// Ensure an empty file does not rewind the timeline.
    #[test]
    fn empty_file_keeps_offset() {
        let a = vec![Cue::new(1, 0.0, 10.0, "a")];
        let b = vec![Cue::new(1, 0.0, 1.0, "b")];
        let merged = merge_cues(&[a, Vec::new(), b], 2.0).unwrap();
        assert_eq!(merged[1].start, 14.0);
    }

    #[test]
    fn rejects_negative_gap() {
        assert!(matches!(merge_cues(&[], -1.0), Err(Error::Validation(_))));
    }
}
