//! Scan driver: concurrent header fetches, sequential aggregation.

use std::sync::atomic::{AtomicBool, Ordering};

use futures::StreamExt;
use mailsweep_mime::{Sender, UnsubscribeMethods};
use tracing::{debug, info};

use crate::account::{MailAccount, SCAN_HEADERS};
use crate::aggregate::Aggregator;
use crate::error::Result;
use crate::model::{MessageHeaderSet, ScanResult};

/// Parameters for one scan pass.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Maximum number of messages to examine.
    pub max_results: usize,
    /// Optional mailbox search query to pre-filter the listing.
    pub query: Option<String>,
    /// Bound on concurrently in-flight header fetches.
    pub workers: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_results: 500,
            query: None,
            workers: 8,
        }
    }
}

/// Outcome of fetching one message's headers.
enum Fetch {
    Headers(MessageHeaderSet),
    Failed,
    Aborted,
}

/// Scans the account and aggregates unsubscribe data per sender.
///
/// Header fetches run concurrently, bounded by `options.workers`, but
/// results are folded in listing order: the aggregator's
/// first-found-wins tie-break always means "first in the listing",
/// not "first fetch to complete". A failed fetch is skipped and the
/// pass continues. Setting `abort` stops the pass after the messages
/// already in flight; everything aggregated so far stays valid.
///
/// `on_progress` receives `(processed, total)` as results are folded.
///
/// # Errors
///
/// Returns an error only if the initial message listing fails;
/// per-message failures are absorbed into `ScanResult::skipped`.
pub async fn scan<A: MailAccount>(
    account: &A,
    options: &ScanOptions,
    abort: &AtomicBool,
    mut on_progress: impl FnMut(usize, usize),
) -> Result<ScanResult> {
    let ids = account
        .list_message_ids(options.max_results, options.query.as_deref())
        .await?;
    let total = ids.len();
    info!("Scanning {total} messages");

    let mut aggregator = Aggregator::new();
    let mut scanned = 0usize;
    let mut skipped = 0usize;
    let mut processed = 0usize;

    let mut fetches = futures::stream::iter(ids.into_iter().map(|id| async move {
        if abort.load(Ordering::Relaxed) {
            return Fetch::Aborted;
        }
        match account.fetch_headers(&id, &SCAN_HEADERS).await {
            Ok(headers) => Fetch::Headers(headers),
            Err(e) => {
                debug!("Skipping message {id}: {e}");
                Fetch::Failed
            }
        }
    }))
    .buffered(options.workers.max(1));

    while let Some(fetch) = fetches.next().await {
        match fetch {
            Fetch::Aborted => break,
            Fetch::Failed => skipped += 1,
            Fetch::Headers(headers) => {
                scanned += 1;
                classify(&headers, &mut aggregator);
            }
        }
        processed += 1;
        on_progress(processed, total);
    }

    if abort.load(Ordering::Relaxed) {
        info!("Scan aborted after {processed}/{total} messages");
    }

    let mut result = aggregator.finish();
    result.scanned = scanned;
    result.skipped = skipped;
    info!(
        "Scan complete: {} senders across {} messages ({} skipped)",
        result.len(),
        result.scanned,
        result.skipped
    );
    Ok(result)
}

/// Classifies one message's headers into the aggregator.
///
/// Messages without an advertising header do not count toward any
/// sender.
fn classify(headers: &MessageHeaderSet, aggregator: &mut Aggregator) {
    let Some(advertising) = headers.get("List-Unsubscribe") else {
        return;
    };

    let sender = Sender::parse(headers.get("From"));
    let methods = UnsubscribeMethods::parse(advertising, headers.get("List-Unsubscribe-Post"));
    aggregator.observe(&sender, methods);
}
