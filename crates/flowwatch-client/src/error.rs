use flowwatch_protocol::SchemaError;
use thiserror::Error;

/// Errors produced while talking to the monitoring backend.
#[derive(Debug, Error)]
pub enum ClientError {
    /// DNS failure, refused connection, timeout, or a broken body stream.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success status on a GET endpoint; `message` is the raw body text.
    #[error("{message} (HTTP {status})")]
    Api { status: u16, message: String },

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("invalid URL '{0}'")]
    InvalidUrl(String),
}

impl ClientError {
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }
}
