//! The mail-account collaborator seam.

use mailsweep_gmail::GmailClient;

use crate::error::Result;
use crate::model::MessageHeaderSet;

/// Headers fetched for each scanned message. Everything the
/// classification step needs; bodies are never requested.
pub const SCAN_HEADERS: [&str; 3] = ["From", "List-Unsubscribe", "List-Unsubscribe-Post"];

/// Operations the core needs from a mail account.
///
/// Authentication and session lifecycle are the implementor's concern;
/// the core only lists, fetches headers, and sends.
#[allow(async_fn_in_trait)] // futures are driven inside the scan task, never spawned
pub trait MailAccount {
    /// Lists up to `max_results` message ids matching `query`.
    async fn list_message_ids(&self, max_results: usize, query: Option<&str>)
    -> Result<Vec<String>>;

    /// Fetches only the named headers of one message.
    async fn fetch_headers(&self, id: &str, header_names: &[&str]) -> Result<MessageHeaderSet>;

    /// Sends a plain-text message from the account.
    async fn send_message(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}

impl MailAccount for GmailClient {
    async fn list_message_ids(
        &self,
        max_results: usize,
        query: Option<&str>,
    ) -> Result<Vec<String>> {
        Ok(Self::list_message_ids(self, max_results, query).await?)
    }

    async fn fetch_headers(&self, id: &str, header_names: &[&str]) -> Result<MessageHeaderSet> {
        let pairs = Self::fetch_headers(self, id, header_names).await?;
        Ok(MessageHeaderSet::from_pairs(pairs))
    }

    async fn send_message(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        Ok(Self::send_message(self, to, subject, body).await?)
    }
}
