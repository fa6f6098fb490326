//! Pure transformations over parsed cues. Every function returns a new
//! sequence and leaves its input untouched.

pub mod clean;
pub mod extract;
pub mod merge;
pub mod shift;
pub mod split;

pub use clean::{clean_cues, clean_srt, CleanOptions};
pub use extract::{extract_text, ExtractOptions};
pub use merge::{merge_cues, merge_srt, DEFAULT_GAP};
pub use shift::{parse_offset, shift_cues, shift_srt};
pub use split::{split_cues, split_line, split_srt, DEFAULT_MAX_CHARS};
