use reqwest::StatusCode;
use thiserror::Error;

/// Everything that can go wrong during one chat turn.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("invalid chat endpoint '{url}': {source}")]
    InvalidEndpoint {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("chat request failed: {0}")]
    Transport(String),

    #[error("chat request timed out")]
    Timeout,

    #[error("chat backend returned {status}: {body}")]
    Status {
        status: StatusCode,
        body: String,
    },

    #[error("malformed chat response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ChatError::Timeout
        } else if err.is_decode() {
            ChatError::Decode(err.to_string())
        } else {
            ChatError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        ChatError::Decode(err.to_string())
    }
}
