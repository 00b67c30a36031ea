// Error handling for the WFDB reader

use thiserror::Error;

pub type Result<T> = std::result::Result<T, WfdbError>;

#[derive(Error, Debug)]
pub enum WfdbError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Not a WFDB header location: {0}")]
    InvalidLocation(String),

    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    #[error("Different formats in the same header not supported: {first} {other}")]
    MixedFormats { first: String, other: String },

    #[error("Corrupted data: {0}")]
    CorruptedData(String),

    #[error("Signal not found: {0}")]
    SignalNotFound(String),
}
