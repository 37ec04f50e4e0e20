//! Error types for the core library.

use thiserror::Error;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Mail-account collaborator failed.
    #[error("Mail account error: {0}")]
    Account(#[from] mailsweep_gmail::Error),

    /// HTTP transport failure during a one-click POST.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// One-click endpoint refused the unsubscribe request.
    #[error("One-click endpoint answered with status {0}")]
    OneClickRejected(u16),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
