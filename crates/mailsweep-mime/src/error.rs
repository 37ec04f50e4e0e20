//! Error types for header parsing.

/// Result type alias for header parsing operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Header parsing error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Not a `mailto:` URI.
    #[error("Not a mailto URI: {0}")]
    NotMailto(String),

    /// Invalid mailto URI.
    #[error("Invalid mailto URI: {0}")]
    InvalidMailto(String),

    /// Mailto URI without a target address.
    #[error("Mailto URI has no target address")]
    MissingAddress,
}
