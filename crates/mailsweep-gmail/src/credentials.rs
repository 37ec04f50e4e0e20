//! Credential storage: OAuth client secrets and cached tokens.
//!
//! Client secrets come from the `credentials.json` file downloaded
//! from Google Cloud Console. The granted token is cached in the
//! platform's native credential store:
//! - Linux: Secret Service (GNOME Keyring, `KWallet`)
//! - macOS: Keychain
//! - Windows: Credential Manager

use std::path::{Path, PathBuf};

use keyring::Entry;
use serde::Deserialize;
use tracing::debug;

use crate::auth::Token;
use crate::error::{Error, Result};

/// Service name used for keyring entries.
const SERVICE_NAME: &str = "mailsweep";

/// Keyring entry key for the cached `OAuth2` token.
const TOKEN_ENTRY: &str = "mailsweep_oauth_token";

/// File name of the Google client secrets file.
const CREDENTIALS_FILE: &str = "credentials.json";

/// OAuth client configuration from Google's "installed application"
/// client secrets format.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    /// Client identifier issued by Google.
    pub client_id: String,
    /// Client secret (installed apps treat this as non-confidential).
    pub client_secret: String,
    /// Authorization endpoint.
    pub auth_uri: String,
    /// Token endpoint.
    pub token_uri: String,
}

/// Wrapper matching the on-disk `credentials.json` layout.
#[derive(Debug, Deserialize)]
struct SecretsFile {
    installed: ClientSecrets,
}

/// Loads client secrets from a `credentials.json` file.
///
/// # Errors
///
/// Returns [`Error::MissingCredentials`] if the file does not exist,
/// or a deserialization error if it is not in the installed-app
/// format.
pub fn load_client_secrets(path: &Path) -> Result<ClientSecrets> {
    if !path.exists() {
        return Err(Error::MissingCredentials(path.to_path_buf()));
    }

    let contents = std::fs::read_to_string(path)?;
    let file: SecretsFile = serde_json::from_str(&contents)?;
    Ok(file.installed)
}

/// Resolves the client secrets path.
///
/// An explicit path wins; otherwise the working directory is checked
/// first (where the Google quickstart places the file), then the user
/// config directory (`<config>/mailsweep/credentials.json`).
///
/// # Errors
///
/// Returns [`Error::MissingCredentials`] when no candidate exists.
pub fn locate(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    let cwd_candidate = PathBuf::from(CREDENTIALS_FILE);
    if cwd_candidate.exists() {
        return Ok(cwd_candidate);
    }

    let config_candidate = dirs::config_dir().map(|dir| dir.join(SERVICE_NAME).join(CREDENTIALS_FILE));
    if let Some(candidate) = config_candidate
        && candidate.exists()
    {
        return Ok(candidate);
    }

    Err(Error::MissingCredentials(cwd_candidate))
}

/// Stores the `OAuth2` token in the system keyring, serialized as
/// JSON.
///
/// # Errors
///
/// Returns an error if serialization or the keyring operation fails.
pub fn store_token(token: &Token) -> Result<()> {
    let token_json = serde_json::to_string(token)?;
    let entry = Entry::new(SERVICE_NAME, TOKEN_ENTRY)?;
    entry.set_password(&token_json)?;
    debug!("Stored OAuth2 token in keyring");
    Ok(())
}

/// Retrieves the cached `OAuth2` token from the system keyring.
///
/// A missing entry is not an error; a stored token that no longer
/// deserializes (format drift) is discarded as if absent.
///
/// # Errors
///
/// Returns an error if the keyring operation fails.
pub fn load_token() -> Result<Option<Token>> {
    let entry = Entry::new(SERVICE_NAME, TOKEN_ENTRY)?;
    match entry.get_password() {
        Ok(token_json) => match serde_json::from_str(&token_json) {
            Ok(token) => Ok(Some(token)),
            Err(e) => {
                debug!("Discarding unreadable cached token: {e}");
                Ok(None)
            }
        },
        Err(keyring::Error::NoEntry) => {
            debug!("No cached OAuth2 token");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Deletes the cached `OAuth2` token.
///
/// # Errors
///
/// Returns an error if the keyring operation fails (a missing entry
/// is fine).
pub fn delete_token() -> Result<()> {
    let entry = Entry::new(SERVICE_NAME, TOKEN_ENTRY)?;
    match entry.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(e.into()),
    }
}
