//! Typed Gmail REST client.
//!
//! Covers the three operations the scanner needs: paginated message-id
//! listing, metadata-only header fetches (message bodies are never
//! downloaded), and sending a composed plain-text message.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::{Error, Result};

/// Gmail API base for the authenticated user.
const API_BASE: &str = "https://gmail.googleapis.com/gmail/v1/users/me";

/// Largest page size the list endpoint accepts.
const MAX_PAGE_SIZE: usize = 500;

/// Request timeout for API calls.
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Authenticated Gmail REST client.
#[derive(Debug, Clone)]
pub struct GmailClient {
    http: reqwest::Client,
    access_token: String,
}

/// One page of a message listing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    messages: Vec<MessageRef>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// Message reference from the list endpoint.
#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

/// Metadata-format message from the get endpoint.
#[derive(Debug, Deserialize)]
struct MessageMetadata {
    #[serde(default)]
    payload: Option<MessagePayload>,
}

/// Payload section carrying the requested headers.
#[derive(Debug, Deserialize)]
struct MessagePayload {
    #[serde(default)]
    headers: Vec<MessageHeader>,
}

/// A single name/value header pair.
#[derive(Debug, Deserialize)]
struct MessageHeader {
    name: String,
    value: String,
}

impl GmailClient {
    /// Creates a client from an access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(access_token: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            access_token: access_token.into(),
        })
    }

    /// Lists message ids, newest first, following pagination until
    /// `max_results` ids are collected or the mailbox runs out.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the request or the
    /// transport fails.
    pub async fn list_message_ids(
        &self,
        max_results: usize,
        query: Option<&str>,
    ) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        let mut page_token: Option<String> = None;

        while ids.len() < max_results {
            let page_size = (max_results - ids.len()).min(MAX_PAGE_SIZE);

            let mut request = self
                .http
                .get(format!("{API_BASE}/messages"))
                .bearer_auth(&self.access_token)
                .query(&[("maxResults", page_size.to_string())]);

            if let Some(q) = query {
                request = request.query(&[("q", q)]);
            }
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }

            let response = ensure_success(request.send().await?).await?;
            let page: ListResponse = response.json().await?;

            if page.messages.is_empty() {
                break;
            }
            ids.extend(page.messages.into_iter().map(|m| m.id));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        ids.truncate(max_results);
        debug!("Listed {} message ids", ids.len());
        Ok(ids)
    }

    /// Fetches only the named headers of one message
    /// (`format=metadata`, never the body).
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the request or the
    /// transport fails.
    pub async fn fetch_headers(
        &self,
        id: &str,
        header_names: &[&str],
    ) -> Result<Vec<(String, String)>> {
        let mut request = self
            .http
            .get(format!("{API_BASE}/messages/{id}"))
            .bearer_auth(&self.access_token)
            .query(&[("format", "metadata")]);

        for name in header_names {
            request = request.query(&[("metadataHeaders", name)]);
        }

        let response = ensure_success(request.send().await?).await?;
        let metadata: MessageMetadata = response.json().await?;

        Ok(metadata
            .payload
            .map(|p| p.headers)
            .unwrap_or_default()
            .into_iter()
            .map(|h| (h.name, h.value))
            .collect())
    }

    /// Sends a plain-text message from the authenticated account.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the send or the transport
    /// fails.
    pub async fn send_message(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let raw = URL_SAFE_NO_PAD.encode(build_rfc5322(to, subject, body));

        let response = self
            .http
            .post(format!("{API_BASE}/messages/send"))
            .bearer_auth(&self.access_token)
            .json(&json!({ "raw": raw }))
            .send()
            .await?;

        ensure_success(response).await?;
        debug!("Sent message to {to}");
        Ok(())
    }
}

/// Maps non-success statuses to [`Error::Api`] with the response body.
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    Err(Error::Api {
        status: status.as_u16(),
        message,
    })
}

/// Builds the RFC 5322 wire form of a plain-text message.
fn build_rfc5322(to: &str, subject: &str, body: &str) -> String {
    format!(
        "To: {to}\r\n\
         Subject: {subject}\r\n\
         MIME-Version: 1.0\r\n\
         Content-Type: text/plain; charset=utf-8\r\n\
         Content-Transfer-Encoding: 8bit\r\n\
         \r\n\
         {body}"
    )
}
