//! # mailsweep-gmail
//!
//! Gmail REST API collaborator for the mailsweep scanner.
//!
//! ## Features
//!
//! - **`OAuth2`**: Google installed-app authorization-code flow with
//!   PKCE and a loopback redirect listener, token refresh, scope
//!   checking
//! - **Credential storage**: client secrets from `credentials.json`,
//!   token cached in the system keyring
//! - **Messages**: paginated id listing, metadata-only header fetch,
//!   raw RFC 5322 send
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailsweep_gmail::{Authenticator, GmailClient, credentials};
//!
//! let secrets = credentials::load_client_secrets(&credentials::locate(None)?)?;
//! let token = Authenticator::new(secrets)
//!     .obtain_token(|url| println!("Visit: {url}"))
//!     .await?;
//!
//! let client = GmailClient::new(token.access_token)?;
//! let ids = client.list_message_ids(500, None).await?;
//! let headers = client.fetch_headers(&ids[0], &["From", "List-Unsubscribe"]).await?;
//! ```
//!
//! Authentication and token lifecycle live entirely in this crate; the
//! scanning core only sees the message-level operations.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod auth;
mod client;
mod error;

pub mod credentials;

pub use auth::{Authenticator, GMAIL_SCOPE, Token};
pub use client::GmailClient;
pub use error::{Error, Result};
