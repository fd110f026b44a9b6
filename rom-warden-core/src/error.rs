use thiserror::Error;

/// Errors that can occur while extracting identity from a ROM or disc image.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// I/O error while reading the file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file format is not recognized or is invalid
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// The header is corrupted or incomplete
    #[error("Corrupted header: {0}")]
    CorruptedHeader(String),

    /// The file is too small to contain valid data
    #[error("File too small: expected at least {expected} bytes, got {actual}")]
    TooSmall { expected: u64, actual: u64 },

    /// Generic extraction error with message
    #[error("{0}")]
    Other(String),
}

impl IdentityError {
    pub fn invalid_format(msg: impl Into<String>) -> Self {
        Self::InvalidFormat(msg.into())
    }

    pub fn corrupted_header(msg: impl Into<String>) -> Self {
        Self::CorruptedHeader(msg.into())
    }

    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// True when the underlying cause is a transient I/O failure worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::Interrupted
                    | std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::WouldBlock
            ),
            _ => false,
        }
    }
}
