use thiserror::Error;

/// Errors produced by the telsh session layer.
#[derive(Debug, Error)]
pub enum TelshError {
    #[error("connect failed: {0}")]
    Connect(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("stream is closed")]
    StreamClosed,

    #[error("timeout")]
    Timeout,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type TelshResult<T> = Result<T, TelshError>;
