use thiserror::Error;

/// Top-level error type used across the entire application.
#[derive(Debug, Error)]
pub enum MonError {
    #[error("config error: {0}")]
    Config(String),

    #[error("sampling error: {0}")]
    Sampling(String),

    #[error("state error: {0}")]
    State(String),
}

pub type Result<T, E = MonError> = std::result::Result<T, E>;
