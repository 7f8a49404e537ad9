use thiserror::Error;

/// Coarse classification used by callers to pick a propagation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Fetch,
    Persistence,
    Validation,
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("server responded with status {status} for {url}")]
    Status { status: u16, url: String },
    #[error("response body is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("malformed payload: {0}")]
    Validation(String),
    #[error("page numbers start at 1, got {0}")]
    InvalidPage(u32),
    #[error("invalid API url: {0}")]
    Url(#[from] url::ParseError),
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
    #[error("failed to encode stored value: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("feed task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("feed session is closed")]
    SessionClosed,
}

impl FeedError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FeedError::Network(_)
            | FeedError::Status { .. }
            | FeedError::Parse(_)
            | FeedError::Url(_)
            | FeedError::Task(_)
            | FeedError::SessionClosed => ErrorKind::Fetch,
            FeedError::Validation(_) | FeedError::InvalidPage(_) => ErrorKind::Validation,
            FeedError::Storage(_) | FeedError::Encode(_) => ErrorKind::Persistence,
        }
    }
}
