//! Error types for the elza runtime.

/// Top-level error type for the conversational assistant runtime.
#[derive(Debug, thiserror::Error)]
pub enum ElzaError {
    /// Speech input capability error.
    #[error("speech input error: {0}")]
    Input(String),

    /// Speech output capability error.
    #[error("speech output error: {0}")]
    Output(String),

    /// Reasoning port error (remote call failed or was refused).
    #[error("reasoning error: {0}")]
    Reasoning(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, ElzaError>;
