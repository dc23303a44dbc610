use std::time::Duration;

/// Errors produced while invoking the text generation capability.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationError {
    #[error("generation timed out after {0:?}")]
    Timeout(Duration),

    #[error("generation capability unavailable: {0}")]
    Unavailable(String),

    #[error("generation capability returned status {status}: {message}")]
    Status {
        status: u16,
        message: String,
        /// `Retry-After` header value in whole seconds, when the server sent one.
        retry_after_secs: Option<u64>,
    },

    #[error("invalid invoker configuration: {0}")]
    InvalidConfig(String),

    #[error("malformed generation response: {0}")]
    Malformed(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, GenerationError>;
