//! Google `OAuth2` installed-app authorization flow.
//!
//! Implements the authorization-code flow with PKCE (RFC 7636) for a
//! desktop client: a loopback listener receives the redirect, the code
//! is exchanged at the token endpoint, and the granted token is cached
//! in the system keyring. Scanning requires the `gmail.modify` scope
//! (read metadata and send the unsubscribe mails).

use std::collections::HashMap;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info};
use url::Url;

use crate::credentials::{self, ClientSecrets};
use crate::error::{Error, Result};

/// Scope required for scanning headers and sending unsubscribe mails.
pub const GMAIL_SCOPE: &str = "https://www.googleapis.com/auth/gmail.modify";

/// `OAuth2` access token with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    /// Access token string.
    pub access_token: String,
    /// Expiration time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Refresh token for obtaining new access tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Scope granted by the authorization server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl Token {
    /// Builds a token from a token-endpoint response.
    fn from_response(response: TokenResponse) -> Self {
        let expires_at = response
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(i64::from(secs)));

        Self {
            access_token: response.access_token,
            expires_at,
            refresh_token: response.refresh_token,
            scope: response.scope,
        }
    }

    /// Checks if the token is expired (with a 60 second buffer).
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|exp| Utc::now() + Duration::seconds(60) >= exp)
    }

    /// Checks whether the granted scopes include `required`.
    ///
    /// A token granted under different scopes must not be reused: the
    /// API would reject calls and the cached grant has to be redone.
    #[must_use]
    pub fn covers_scope(&self, required: &str) -> bool {
        self.scope
            .as_deref()
            .is_some_and(|granted| granted.split_whitespace().any(|s| s == required))
    }
}

/// Token response from the `OAuth2` token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u32>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    scope: Option<String>,
}

/// Error response from the `OAuth2` token endpoint.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
    #[serde(default)]
    error_description: String,
}

/// Drives the installed-app authorization flow for one Google client.
#[derive(Debug)]
pub struct Authenticator {
    secrets: ClientSecrets,
    http: reqwest::Client,
}

impl Authenticator {
    /// Creates an authenticator from loaded client secrets.
    #[must_use]
    pub fn new(secrets: ClientSecrets) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { secrets, http }
    }

    /// Obtains a usable access token.
    ///
    /// Order of preference: cached token from the keyring (if its
    /// scopes still cover [`GMAIL_SCOPE`] and it has not expired),
    /// refresh of an expired cached token, interactive authorization.
    /// `on_auth_url` is invoked with the consent URL when the
    /// interactive flow runs, so the caller can print or open it.
    ///
    /// # Errors
    ///
    /// Returns an error if the keyring, the token endpoint, or the
    /// redirect listener fails, or if the user denies consent.
    pub async fn obtain_token(&self, on_auth_url: impl FnOnce(&Url)) -> Result<Token> {
        if let Some(cached) = credentials::load_token()? {
            if !cached.covers_scope(GMAIL_SCOPE) {
                info!("Cached token was granted for different scopes, re-authorizing");
                credentials::delete_token()?;
            } else if !cached.is_expired() {
                debug!("Using cached access token");
                return Ok(cached);
            } else if cached.refresh_token.is_some() {
                match self.refresh(&cached).await {
                    Ok(fresh) => {
                        credentials::store_token(&fresh)?;
                        return Ok(fresh);
                    }
                    Err(e) => {
                        info!("Token refresh failed ({e}), re-authorizing");
                        credentials::delete_token()?;
                    }
                }
            }
        }

        let token = self.authorize_interactive(on_auth_url).await?;
        credentials::store_token(&token)?;
        Ok(token)
    }

    /// Runs the interactive consent flow with a loopback redirect.
    async fn authorize_interactive(&self, on_auth_url: impl FnOnce(&Url)) -> Result<Token> {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
        let port = listener.local_addr()?.port();
        let redirect_uri = format!("http://127.0.0.1:{port}");

        let (verifier, challenge) = pkce_pair();
        let state = random_token(16);

        let auth_url = self.authorization_url(&redirect_uri, &challenge, &state)?;
        on_auth_url(&auth_url);

        let code = wait_for_redirect(&listener, &state).await?;
        debug!("Received authorization code, exchanging for token");
        self.exchange_code(&code, &redirect_uri, &verifier).await
    }

    /// Builds the consent URL for the user's browser.
    fn authorization_url(&self, redirect_uri: &str, challenge: &str, state: &str) -> Result<Url> {
        let mut url = Url::parse(&self.secrets.auth_uri)?;

        url.query_pairs_mut()
            .append_pair("client_id", &self.secrets.client_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("scope", GMAIL_SCOPE)
            .append_pair("code_challenge", challenge)
            .append_pair("code_challenge_method", "S256")
            .append_pair("state", state)
            // Offline access so Google issues a refresh token.
            .append_pair("access_type", "offline")
            .append_pair("prompt", "consent");

        Ok(url)
    }

    /// Exchanges the authorization code for a token.
    async fn exchange_code(&self, code: &str, redirect_uri: &str, verifier: &str) -> Result<Token> {
        let mut params = HashMap::new();
        params.insert("grant_type", "authorization_code");
        params.insert("code", code);
        params.insert("client_id", self.secrets.client_id.as_str());
        params.insert("client_secret", self.secrets.client_secret.as_str());
        params.insert("redirect_uri", redirect_uri);
        params.insert("code_verifier", verifier);

        self.token_request(&params).await
    }

    /// Refreshes an expired token.
    ///
    /// # Errors
    ///
    /// Returns an error if the token has no refresh token or the
    /// endpoint rejects the refresh.
    pub async fn refresh(&self, token: &Token) -> Result<Token> {
        let refresh_token = token
            .refresh_token
            .as_deref()
            .ok_or_else(|| Error::Authorization("no refresh token available".to_string()))?;

        let mut params = HashMap::new();
        params.insert("grant_type", "refresh_token");
        params.insert("refresh_token", refresh_token);
        params.insert("client_id", self.secrets.client_id.as_str());
        params.insert("client_secret", self.secrets.client_secret.as_str());

        let mut fresh = self.token_request(&params).await?;

        // Google omits the refresh token on refresh responses.
        if fresh.refresh_token.is_none() {
            fresh.refresh_token.clone_from(&token.refresh_token);
        }

        Ok(fresh)
    }

    /// Posts form parameters to the token endpoint.
    async fn token_request(&self, params: &HashMap<&str, &str>) -> Result<Token> {
        let response = self
            .http
            .post(&self.secrets.token_uri)
            .form(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let error: ErrorResponse = response.json().await?;
            return Err(Error::OAuth {
                error: error.error,
                description: error.error_description,
            });
        }

        let token_response: TokenResponse = response.json().await?;
        Ok(Token::from_response(token_response))
    }
}

/// Generates a PKCE verifier/challenge pair (S256).
fn pkce_pair() -> (String, String) {
    let verifier = random_token(32);
    let challenge = URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()));
    (verifier, challenge)
}

/// Generates a URL-safe random token from `bytes` random bytes.
fn random_token(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rand::thread_rng().fill(buf.as_mut_slice());
    URL_SAFE_NO_PAD.encode(buf)
}

/// Waits for the browser redirect carrying the authorization code.
///
/// Stray requests (favicon probes and the like) get a 404 and the
/// listener keeps waiting.
async fn wait_for_redirect(listener: &TcpListener, expected_state: &str) -> Result<String> {
    loop {
        let (mut stream, _) = listener.accept().await?;

        let mut buf = vec![0u8; 4096];
        let n = stream.read(&mut buf).await?;
        let request = String::from_utf8_lossy(&buf[..n]);

        let Some(target) = request
            .lines()
            .next()
            .and_then(|line| line.split_whitespace().nth(1))
        else {
            respond(&mut stream, "400 Bad Request", "Bad request.").await?;
            continue;
        };

        let url = Url::parse(&format!("http://127.0.0.1{target}"))?;
        let params: HashMap<String, String> = url.query_pairs().into_owned().collect();

        if let Some(error) = params.get("error") {
            respond(&mut stream, "200 OK", "Authorization failed. You can close this tab.")
                .await?;
            return Err(Error::Authorization(error.clone()));
        }

        let Some(code) = params.get("code") else {
            respond(&mut stream, "404 Not Found", "Not found.").await?;
            continue;
        };

        if params.get("state").map(String::as_str) != Some(expected_state) {
            respond(&mut stream, "200 OK", "Authorization failed. You can close this tab.")
                .await?;
            return Err(Error::Authorization("state parameter mismatch".to_string()));
        }

        respond(&mut stream, "200 OK", "Authorization complete. You can close this tab.").await?;
        return Ok(code.clone());
    }
}

/// Writes a minimal HTTP response and closes the connection.
async fn respond(stream: &mut TcpStream, status: &str, body: &str) -> Result<()> {
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await?;
    Ok(())
}
