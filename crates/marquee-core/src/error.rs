use thiserror::Error;

/// Top-level error type for the marquee system.
///
/// Subsystem crates define their own error types and convert into
/// `MarqueeError` where they cross into configuration or persistence code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MarqueeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid conversation role: {0}")]
    InvalidRole(String),

    #[error("API error: {0}")]
    Api(String),
}

impl From<toml::de::Error> for MarqueeError {
    fn from(err: toml::de::Error) -> Self {
        MarqueeError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for MarqueeError {
    fn from(err: toml::ser::Error) -> Self {
        MarqueeError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for MarqueeError {
    fn from(err: serde_json::Error) -> Self {
        MarqueeError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for marquee operations.
pub type Result<T> = std::result::Result<T, MarqueeError>;
