//! Error types for the Gmail collaborator.

use std::path::PathBuf;

/// Result type alias for Gmail operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from authentication or Gmail API calls.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Gmail API rejected the request.
    #[error("Gmail API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, as returned by the API.
        message: String,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Keyring access failed.
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    /// Client secrets file not found.
    #[error(
        "credentials file not found at {0}; download the OAuth client \
         secrets from Google Cloud Console (APIs & Services -> Credentials)"
    )]
    MissingCredentials(PathBuf),

    /// `OAuth2` server returned an error response.
    #[error("OAuth error: {error}: {description}")]
    OAuth {
        /// Error code from the authorization server.
        error: String,
        /// Human-readable description.
        description: String,
    },

    /// The user declined authorization, or the redirect was malformed.
    #[error("Authorization failed: {0}")]
    Authorization(String),

    /// Invalid URL construction.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}
