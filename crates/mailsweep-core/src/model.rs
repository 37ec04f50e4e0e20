//! Domain models for a scan pass.

use std::collections::BTreeMap;

use mailsweep_mime::{MailtoTarget, UnsubscribeMethods};

/// Case-insensitive view of one message's fetched headers.
///
/// Ephemeral: produced by the mail collaborator per message, consumed
/// by the classification step, then dropped.
#[derive(Debug, Clone, Default)]
pub struct MessageHeaderSet {
    headers: Vec<(String, String)>,
}

impl MessageHeaderSet {
    /// Wraps raw name/value pairs as returned by the collaborator.
    #[must_use]
    pub fn from_pairs(headers: Vec<(String, String)>) -> Self {
        Self { headers }
    }

    /// Returns the first value for `name`, compared case-insensitively.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Aggregated state for one canonical sender address.
#[derive(Debug, Clone)]
pub struct SenderRecord {
    /// Lowercased email address, the aggregation key.
    pub address: String,
    /// Best-known decoded display name (latest non-empty wins).
    pub display_name: String,
    /// Scanned messages from this sender that advertised unsubscribe.
    pub occurrence_count: u32,
    /// First non-empty set of methods observed for this sender.
    pub methods: UnsubscribeMethods,
}

impl SenderRecord {
    /// Resolves the priority policy to the single action that applies
    /// to this sender: one-click, then mailto, then the manual link.
    #[must_use]
    pub fn action(&self) -> UnsubscribeAction {
        if let Some(url) = &self.methods.one_click {
            UnsubscribeAction::OneClick(url.clone())
        } else if let Some(target) = &self.methods.mailto {
            UnsubscribeAction::Mailto(target.clone())
        } else if let Some(link) = &self.methods.http {
            UnsubscribeAction::Manual(link.clone())
        } else {
            UnsubscribeAction::NoMethod
        }
    }
}

/// The unsubscribe mechanism chosen for a sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnsubscribeAction {
    /// RFC 8058 one-click POST to this endpoint.
    OneClick(String),
    /// Automated unsubscribe mail to this target.
    Mailto(MailtoTarget),
    /// Link the operator must open themselves.
    Manual(String),
    /// The sender advertised nothing usable.
    NoMethod,
}

/// Result of one scan pass: canonical address to sender record.
///
/// Owned by the aggregator while the scan runs; read-only afterwards.
/// Never persisted.
#[derive(Debug, Default)]
pub struct ScanResult {
    pub(crate) senders: BTreeMap<String, SenderRecord>,
    /// Messages whose headers were fetched and classified.
    pub scanned: usize,
    /// Messages skipped after a fetch failure.
    pub skipped: usize,
}

impl ScanResult {
    /// Iterates over all sender records.
    pub fn senders(&self) -> impl Iterator<Item = &SenderRecord> {
        self.senders.values()
    }

    /// Looks up a sender by canonical address.
    #[must_use]
    pub fn get(&self, address: &str) -> Option<&SenderRecord> {
        self.senders.get(address)
    }

    /// Number of distinct senders observed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.senders.len()
    }

    /// Returns true if no sender was observed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}
