//! Application-wide error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config namespace not found: {0}")]
    ConfigNotFound(String),

    #[error("infinite loop detected, function: {function}, inputs: {inputs}")]
    LoopDetected { function: String, inputs: String },

    #[error("signature error: {0}")]
    Signature(String),

    #[error("state error: {0}")]
    State(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("logger error: {0}")]
    Logger(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
