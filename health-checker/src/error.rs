use thiserror::Error;

/// Input errors raised before any network activity.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("invalid target URL '{url}': {reason}")]
    InvalidTarget { url: String, reason: String },
}

/// Transport-level failures reported by an [`HttpClient`](crate::HttpClient).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HttpClientError {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for HttpClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            HttpClientError::Timeout
        } else if err.is_connect() {
            HttpClientError::Connect(root_cause(&err))
        } else {
            HttpClientError::Other(root_cause(&err))
        }
    }
}

/// reqwest wraps hyper and io errors several levels deep; the innermost
/// message is the one worth showing.
pub fn root_cause(err: &(dyn std::error::Error + 'static)) -> String {
    let mut current = err;
    while let Some(source) = current.source() {
        current = source;
    }
    current.to_string()
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("registry I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("registry is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no registry entry with id '{0}'")]
    NotFound(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be a number, got '{value}'")]
    Parse { key: &'static str, value: String },
    #[error("{0}")]
    Invalid(&'static str),
}
