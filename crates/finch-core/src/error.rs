use thiserror::Error;

/// Top-level error type for the Finch workspace.
///
/// Subsystem crates define their own error types; anything that surfaces at
/// the composition root (config loading, server startup) converts into
/// `FinchError` so the `?` operator works across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FinchError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Chat error: {0}")]
    Chat(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for FinchError {
    fn from(err: toml::de::Error) -> Self {
        FinchError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for FinchError {
    fn from(err: toml::ser::Error) -> Self {
        FinchError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for FinchError {
    fn from(err: serde_json::Error) -> Self {
        FinchError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Finch operations.
pub type Result<T> = std::result::Result<T, FinchError>;
