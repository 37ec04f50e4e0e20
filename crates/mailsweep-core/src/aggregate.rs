//! Per-sender aggregation of scanned messages.

use mailsweep_mime::{Sender, UnsubscribeMethods};
use tracing::trace;

use crate::model::{ScanResult, SenderRecord};

/// Folds per-message observations into per-sender records.
///
/// Single-writer: the scan driver feeds observations sequentially in
/// listing order, so "first found" is deterministic regardless of how
/// concurrently the headers were fetched.
#[derive(Debug, Default)]
pub struct Aggregator {
    result: ScanResult,
}

impl Aggregator {
    /// Creates an empty aggregator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one message that advertised unsubscribe support.
    ///
    /// Increments the sender's occurrence count, updates the display
    /// name to the latest non-empty value, and freezes `methods` at
    /// the first non-empty set observed: later messages never
    /// overwrite already-found methods.
    pub fn observe(&mut self, sender: &Sender, methods: UnsubscribeMethods) {
        let record = self
            .result
            .senders
            .entry(sender.address.clone())
            .or_insert_with(|| SenderRecord {
                address: sender.address.clone(),
                display_name: sender.display_name.clone(),
                occurrence_count: 0,
                methods: UnsubscribeMethods::default(),
            });

        record.occurrence_count += 1;

        if !sender.display_name.trim().is_empty() {
            record.display_name.clone_from(&sender.display_name);
        }

        if record.methods.is_empty() && !methods.is_empty() {
            trace!("First methods for {}: {methods:?}", sender.address);
            record.methods = methods;
        }
    }

    /// Consumes the aggregator and releases the scan result.
    #[must_use]
    pub fn finish(self) -> ScanResult {
        self.result
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sender(name: &str, address: &str) -> Sender {
        Sender {
            display_name: name.to_string(),
            address: address.to_string(),
        }
    }

    #[test]
    fn test_counts_accumulate() {
        let mut aggregator = Aggregator::new();
        for _ in 0..3 {
            aggregator.observe(&sender("News", "news@x.com"), UnsubscribeMethods::default());
        }
        aggregator.observe(&sender("Other", "other@x.com"), UnsubscribeMethods::default());

        let result = aggregator.finish();
        assert_eq!(result.len(), 2);
        assert_eq!(result.get("news@x.com").unwrap().occurrence_count, 3);
        assert_eq!(result.get("other@x.com").unwrap().occurrence_count, 1);
    }

    #[test]
    fn test_first_methods_win() {
        let first = UnsubscribeMethods::parse("<mailto:first@x.com>", None);
        let second = UnsubscribeMethods::parse("<mailto:second@x.com>", None);

        let mut aggregator = Aggregator::new();
        aggregator.observe(&sender("News", "news@x.com"), first);
        aggregator.observe(&sender("News", "news@x.com"), second);

        let result = aggregator.finish();
        let record = result.get("news@x.com").unwrap();
        assert_eq!(record.occurrence_count, 2);
        assert_eq!(record.methods.mailto.as_ref().unwrap().address, "first@x.com");
    }

    #[test]
    fn test_empty_methods_do_not_freeze() {
        let later = UnsubscribeMethods::parse("<https://x.com/u>", None);

        let mut aggregator = Aggregator::new();
        aggregator.observe(&sender("News", "news@x.com"), UnsubscribeMethods::default());
        aggregator.observe(&sender("News", "news@x.com"), later);

        let result = aggregator.finish();
        let record = result.get("news@x.com").unwrap();
        assert_eq!(record.methods.http.as_deref(), Some("https://x.com/u"));
    }

    #[test]
    fn test_latest_display_name_wins() {
        let mut aggregator = Aggregator::new();
        aggregator.observe(&sender("Old Name", "news@x.com"), UnsubscribeMethods::default());
        aggregator.observe(&sender("New Name", "news@x.com"), UnsubscribeMethods::default());
        aggregator.observe(&sender("  ", "news@x.com"), UnsubscribeMethods::default());

        let result = aggregator.finish();
        assert_eq!(result.get("news@x.com").unwrap().display_name, "New Name");
    }
}
