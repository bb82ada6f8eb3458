use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error("Log API request failed: {0}")]
    Transport(String),

    #[error("Log API timed out after {0:?}")]
    Timeout(Duration),

    #[error("Log API error: {status} - {body}")]
    Status { status: u16, body: String },

    #[error("Log API response parse failed: {0}")]
    Decode(String),

    #[error("Filter not supported by schema {schema}: {filter}")]
    UnsupportedFilter { schema: String, filter: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl QueryError {
    /// Transport failures, timeouts and 5xx responses are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            QueryError::Transport(_) | QueryError::Timeout(_) => true,
            QueryError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
