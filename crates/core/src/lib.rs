//! Subtitle format conversion, subtitle clean-up tools and 3D LUT colour
//! grading.
//!
//! Every subtitle format is parsed into a list of [`Cue`]s and written back out
//! as SRT, or as Final Cut Pro titles by [`fcpxml`]. The [`convert`] module ties
//! parsers and transforms to file paths; [`lut`] grades RGBA buffers with
//! `.cube` lookup tables.

pub mod bcc;
pub mod convert;
pub mod error;
pub mod fcpxml;
pub mod lrc;
pub mod lut;
pub mod script;
pub mod srt;
pub mod timecode;
pub mod transform;
pub mod vtt;

pub use error::{Error, Result};
pub use srt::Cue;
