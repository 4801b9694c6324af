//! Error types for the catalog gateway.

use marquee_core::error::MarqueeError;

/// Errors surfaced at the catalog gateway boundary.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}

impl CatalogError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        CatalogError::NotFound {
            entity,
            key: key.to_string(),
        }
    }
}

impl From<MarqueeError> for CatalogError {
    fn from(err: MarqueeError) -> Self {
        CatalogError::Unavailable(err.to_string())
    }
}
