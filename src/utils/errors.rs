use thiserror::Error;

/// Main error type for the Ask Coach shell (configuration, I/O, setup)
#[derive(Error, Debug)]
pub enum CoachError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Network error: {0}")]
    NetworkError(String),
}
