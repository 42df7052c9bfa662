use thiserror::Error;

/// Failures when parsing or serializing wire formats
#[derive(Debug, PartialEq, Eq, Error)]
pub enum HeaderError {
    #[error("Buffer too small: expected at least {expected} bytes, actual {found} bytes")]
    BufferTooSmall { expected: usize, found: usize },

    #[error("Bad checksum: {0}")]
    BadChecksum(String),

    #[error("Malformed field: {0}")]
    Malformed(String),

    #[error("Unsupported format: {0}")]
    Unsupported(String),
}
