//! Integration tests for the scan and execution pipeline.
//!
//! These tests use a fake mail account so no Gmail or network access
//! is required.

#![allow(clippy::unwrap_used)]

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use mailsweep_core::{
    MailAccount, MessageHeaderSet, ScanOptions, SenderRecord, UnsubscribeMethods, Unsubscriber,
    scan, select,
};

/// In-memory mail account. Message ids are listing indices; fetches
/// for ids in `fail_ids` error out.
#[derive(Default)]
struct FakeAccount {
    messages: Vec<Vec<(String, String)>>,
    fail_ids: HashSet<String>,
    send_fails: bool,
    sent: Mutex<Vec<(String, String, String)>>,
}

impl FakeAccount {
    fn new(messages: Vec<Vec<(&str, &str)>>) -> Self {
        Self {
            messages: messages
                .into_iter()
                .map(|headers| {
                    headers
                        .into_iter()
                        .map(|(n, v)| (n.to_string(), v.to_string()))
                        .collect()
                })
                .collect(),
            ..Self::default()
        }
    }

    fn sent_messages(&self) -> Vec<(String, String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

fn api_error(message: &str) -> mailsweep_core::Error {
    mailsweep_core::Error::Account(mailsweep_gmail::Error::Api {
        status: 500,
        message: message.to_string(),
    })
}

impl MailAccount for FakeAccount {
    async fn list_message_ids(
        &self,
        max_results: usize,
        _query: Option<&str>,
    ) -> mailsweep_core::Result<Vec<String>> {
        Ok((0..self.messages.len().min(max_results))
            .map(|i| i.to_string())
            .collect())
    }

    async fn fetch_headers(
        &self,
        id: &str,
        _header_names: &[&str],
    ) -> mailsweep_core::Result<MessageHeaderSet> {
        if self.fail_ids.contains(id) {
            return Err(api_error("metadata fetch failed"));
        }
        let index: usize = id.parse().unwrap();
        Ok(MessageHeaderSet::from_pairs(self.messages[index].clone()))
    }

    async fn send_message(
        &self,
        to: &str,
        subject: &str,
        body: &str,
    ) -> mailsweep_core::Result<()> {
        if self.send_fails {
            return Err(api_error("send rejected"));
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string(), body.to_string()));
        Ok(())
    }
}

fn newsletter(from: &str) -> Vec<(&str, &str)> {
    vec![
        ("From", from),
        ("List-Unsubscribe", "<mailto:leave@x.com>"),
    ]
}

fn record(list_unsubscribe: &str, post: Option<&str>) -> SenderRecord {
    SenderRecord {
        address: "news@x.com".to_string(),
        display_name: "News".to_string(),
        occurrence_count: 5,
        methods: UnsubscribeMethods::parse(list_unsubscribe, post),
    }
}

#[tokio::test]
async fn scan_aggregates_the_advertised_methods() {
    let account = FakeAccount::new(vec![vec![
        ("From", "\"A. Sender\" <a@x.com>"),
        (
            "List-Unsubscribe",
            "<mailto:a@x.com?subject=Remove%20me>, <https://x.com/u>",
        ),
        ("List-Unsubscribe-Post", "List-Unsubscribe=One-Click"),
    ]]);

    let abort = AtomicBool::new(false);
    let result = scan(&account, &ScanOptions::default(), &abort, |_, _| {})
        .await
        .unwrap();

    let sender = result.get("a@x.com").unwrap();
    assert_eq!(sender.display_name, "A. Sender");
    assert_eq!(sender.occurrence_count, 1);

    let mailto = sender.methods.mailto.as_ref().unwrap();
    assert_eq!(mailto.address, "a@x.com");
    assert_eq!(mailto.subject.as_deref(), Some("Remove me"));
    assert_eq!(sender.methods.http.as_deref(), Some("https://x.com/u"));
    assert_eq!(sender.methods.one_click.as_deref(), Some("https://x.com/u"));
}

#[tokio::test]
async fn scan_counts_only_advertising_messages() {
    let account = FakeAccount::new(vec![
        newsletter("News <news@x.com>"),
        vec![("From", "friend@x.com")],
        newsletter("News <News@X.com>"),
    ]);

    let abort = AtomicBool::new(false);
    let result = scan(&account, &ScanOptions::default(), &abort, |_, _| {})
        .await
        .unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result.get("news@x.com").unwrap().occurrence_count, 2);
    assert_eq!(result.scanned, 3);
}

#[tokio::test]
async fn scan_skips_failing_fetches() {
    let mut account = FakeAccount::new(vec![
        newsletter("News <news@x.com>"),
        newsletter("News <news@x.com>"),
        newsletter("News <news@x.com>"),
    ]);
    account.fail_ids.insert("1".to_string());

    let abort = AtomicBool::new(false);
    let result = scan(&account, &ScanOptions::default(), &abort, |_, _| {})
        .await
        .unwrap();

    assert_eq!(result.skipped, 1);
    assert_eq!(result.scanned, 2);
    assert_eq!(result.get("news@x.com").unwrap().occurrence_count, 2);
}

#[tokio::test]
async fn scan_reports_progress_in_listing_order() {
    let account = FakeAccount::new(vec![
        newsletter("a <a@x.com>"),
        newsletter("b <b@x.com>"),
        newsletter("c <c@x.com>"),
    ]);

    let abort = AtomicBool::new(false);
    let mut seen = Vec::new();
    scan(&account, &ScanOptions::default(), &abort, |done, total| {
        seen.push((done, total));
    })
    .await
    .unwrap();

    assert_eq!(seen, vec![(1, 3), (2, 3), (3, 3)]);
}

#[tokio::test]
async fn scan_honors_abort_flag() {
    let account = FakeAccount::new(vec![
        newsletter("News <news@x.com>"),
        newsletter("News <news@x.com>"),
    ]);

    let abort = AtomicBool::new(false);
    abort.store(true, Ordering::Relaxed);

    let result = scan(&account, &ScanOptions::default(), &abort, |_, _| {})
        .await
        .unwrap();

    assert!(result.is_empty());
    assert_eq!(result.scanned, 0);
}

#[tokio::test]
async fn scan_respects_max_results() {
    let account = FakeAccount::new(vec![
        newsletter("News <news@x.com>"),
        newsletter("News <news@x.com>"),
        newsletter("News <news@x.com>"),
    ]);

    let abort = AtomicBool::new(false);
    let options = ScanOptions {
        max_results: 2,
        ..ScanOptions::default()
    };
    let result = scan(&account, &options, &abort, |_, _| {}).await.unwrap();

    assert_eq!(result.get("news@x.com").unwrap().occurrence_count, 2);
}

#[tokio::test]
async fn dry_run_never_contacts_the_account() {
    let account = FakeAccount::default();
    let unsubscriber = Unsubscriber::new(&account).unwrap();

    let automatable = record(
        "<mailto:leave@x.com>, <https://x.com/u>",
        Some("List-Unsubscribe=One-Click"),
    );
    let outcome = unsubscriber.execute(&automatable, true).await;
    assert!(outcome.succeeded);
    assert!(outcome.message.contains("one-click"));
    assert!(account.sent_messages().is_empty());

    let manual_only = record("<https://x.com/u>", None);
    let outcome = unsubscriber.execute(&manual_only, true).await;
    assert!(outcome.succeeded);
    assert!(outcome.message.contains("https://x.com/u"));

    let no_method = record("", None);
    let outcome = unsubscriber.execute(&no_method, true).await;
    assert!(!outcome.succeeded);
    assert!(outcome.message.contains("No valid unsubscribe method"));
}

#[tokio::test]
async fn mailto_execution_sends_through_the_account() {
    let account = FakeAccount::default();
    let unsubscriber = Unsubscriber::new(&account).unwrap();

    let target = record("<mailto:leave@x.com?subject=Remove+me>", None);
    let outcome = unsubscriber.execute(&target, false).await;

    assert!(outcome.succeeded);
    let sent = account.sent_messages();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "leave@x.com");
    assert_eq!(sent[0].1, "Remove me");
    assert!(sent[0].2.contains("unsubscribe me"));
}

#[tokio::test]
async fn mailto_without_subject_uses_the_default() {
    let account = FakeAccount::default();
    let unsubscriber = Unsubscriber::new(&account).unwrap();

    unsubscriber
        .execute(&record("<mailto:leave@x.com>", None), false)
        .await;

    assert_eq!(account.sent_messages()[0].1, "Unsubscribe");
}

#[tokio::test]
async fn failed_one_click_falls_back_to_mailto() {
    let account = FakeAccount::default();
    let unsubscriber = Unsubscriber::new(&account).unwrap();

    // Port 1 refuses the connection, so the POST fails immediately.
    let mut target = record("<mailto:leave@x.com>, <http://127.0.0.1:1/u>", None);
    target.methods.one_click = Some("http://127.0.0.1:1/u".to_string());

    let outcome = unsubscriber.execute(&target, false).await;

    assert!(outcome.succeeded);
    assert!(outcome.message.contains("leave@x.com"));
    assert_eq!(account.sent_messages().len(), 1);
}

#[tokio::test]
async fn failed_one_click_without_mailto_surfaces_the_link() {
    let account = FakeAccount::default();
    let unsubscriber = Unsubscriber::new(&account).unwrap();

    let target = record(
        "<http://127.0.0.1:1/u>",
        Some("List-Unsubscribe=One-Click"),
    );
    let outcome = unsubscriber.execute(&target, false).await;

    assert!(!outcome.succeeded);
    assert!(outcome.message.contains("http://127.0.0.1:1/u"));
    assert!(account.sent_messages().is_empty());
}

#[tokio::test]
async fn send_rejection_is_a_per_sender_failure() {
    let account = FakeAccount {
        send_fails: true,
        ..FakeAccount::default()
    };
    let unsubscriber = Unsubscriber::new(&account).unwrap();

    let outcome = unsubscriber
        .execute(&record("<mailto:leave@x.com>", None), false)
        .await;

    assert!(!outcome.succeeded);
    assert!(outcome.message.contains("leave@x.com"));
}

#[tokio::test(start_paused = true)]
async fn batch_continues_past_failures() {
    let account = FakeAccount::default();
    let unsubscriber = Unsubscriber::new(&account).unwrap();

    let good = record("<mailto:leave@x.com>", None);
    let bad = record("", None);
    let records = vec![&bad, &good];

    let mut outcomes = Vec::new();
    let summary = unsubscriber
        .execute_batch(&records, false, |record, outcome| {
            outcomes.push((record.address.clone(), outcome.succeeded));
        })
        .await;

    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(outcomes.len(), 2);
    assert_eq!(account.sent_messages().len(), 1);
}

#[tokio::test]
async fn selection_excludes_below_threshold() {
    let account = FakeAccount::new(vec![
        newsletter("News <news@x.com>"),
        newsletter("News <news@x.com>"),
    ]);

    let abort = AtomicBool::new(false);
    let result = scan(&account, &ScanOptions::default(), &abort, |_, _| {})
        .await
        .unwrap();

    assert!(select(&result, 3).is_empty());
    assert_eq!(select(&result, 2).len(), 1);
}
