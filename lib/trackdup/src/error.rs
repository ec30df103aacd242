use thiserror::Error;

#[derive(Debug, Error)]
pub enum DedupError {
    #[error("scan worker failed: {0}")]
    Worker(String),

    #[error("scan was cancelled")]
    Cancelled,

    #[error("invalid similarity threshold {0}, expected a value within 0.0..=1.0")]
    InvalidThreshold(f64),

    #[error("no track provider configured")]
    NotConfigured,

    #[error("unknown track provider: {0}")]
    UnknownProvider(String),

    #[error("track {0} is not a reported duplicate")]
    UnknownDuplicate(String),

    #[error("provider error: {0}")]
    Provider(String),
}

impl From<tokio::task::JoinError> for DedupError {
    fn from(e: tokio::task::JoinError) -> Self {
        if e.is_cancelled() {
            DedupError::Cancelled
        } else {
            DedupError::Worker(e.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, DedupError>;
