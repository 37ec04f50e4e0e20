//! Filtering and ranking of aggregated senders.

use crate::model::{ScanResult, SenderRecord};

/// Selects senders worth presenting: at least `min_count` occurrences
/// AND at least one usable unsubscribe method.
///
/// Sorted descending by occurrence count. The sort is stable over the
/// aggregator's iteration order; relative order among equal counts is
/// unspecified.
#[must_use]
pub fn select(result: &ScanResult, min_count: u32) -> Vec<&SenderRecord> {
    let mut ranked: Vec<&SenderRecord> = result
        .senders()
        .filter(|record| record.occurrence_count >= min_count && !record.methods.is_empty())
        .collect();

    ranked.sort_by(|a, b| b.occurrence_count.cmp(&a.occurrence_count));
    ranked
}

/// Like [`select`], restricted to senders that can be unsubscribed
/// without human action (one-click or mailto). This is the batch-mode
/// population: manual-link-only senders are excluded by design.
#[must_use]
pub fn select_automatable(result: &ScanResult, min_count: u32) -> Vec<&SenderRecord> {
    let mut ranked = select(result, min_count);
    ranked.retain(|record| record.methods.is_automatable());
    ranked
}
