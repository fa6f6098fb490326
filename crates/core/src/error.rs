//! Error type shared by every parser, transformer and the LUT engine.

use thiserror::Error;

/// Failure raised by a conversion or grading operation.
#[derive(Debug, Error)]
pub enum Error {
    /// A fragment of the input could not be parsed (timecode, number, cube row).
    #[error("parse error: {message} (in `{fragment}`)")]
    Parse { message: String, fragment: String },

    /// The container is structurally invalid (wrong LUT row count, BCC without body).
    #[error("format error: {0}")]
    Format(String),

    /// A caller-supplied parameter is out of range or not a number.
    #[error("validation error: {0}")]
    Validation(String),

    /// The background preview task is no longer accepting requests.
    #[error("preview worker has stopped")]
    WorkerStopped,

    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a parse error carrying the offending fragment.
    pub fn parse(message: impl Into<String>, fragment: impl Into<String>) -> Self {
        Error::Parse {
            message: message.into(),
            fragment: fragment.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
