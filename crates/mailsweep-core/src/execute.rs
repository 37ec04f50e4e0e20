//! Unsubscribe execution: priority ladder, fallback, dry-run.

use std::time::Duration;

use tracing::{debug, warn};

use crate::account::MailAccount;
use crate::error::{Error, Result};
use crate::model::{SenderRecord, UnsubscribeAction};

/// Subject used when the mailto target names none.
const DEFAULT_SUBJECT: &str = "Unsubscribe";

/// Body of the unsubscribe request mail.
const DEFAULT_BODY: &str = "Please unsubscribe me from this list.";

/// Form payload required by RFC 8058 for the one-click POST.
const ONE_CLICK_FORM: [(&str, &str); 1] = [("List-Unsubscribe", "One-Click")];

/// Bound on the one-click POST round-trip.
const ONE_CLICK_TIMEOUT: Duration = Duration::from_secs(10);

/// Pause between successive sends in batch mode, so a long batch does
/// not trip the provider's abuse thresholds.
const BATCH_PACING: Duration = Duration::from_secs(1);

/// Result of one unsubscribe attempt, always produced: execution
/// failures for one sender never propagate as errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Whether the attempt (or dry-run simulation) succeeded.
    pub succeeded: bool,
    /// Human-readable description of what happened.
    pub message: String,
}

impl Outcome {
    fn success(message: impl Into<String>) -> Self {
        Self {
            succeeded: true,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            message: message.into(),
        }
    }
}

/// Tally of a batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Senders unsubscribed successfully.
    pub succeeded: usize,
    /// Senders whose attempt failed.
    pub failed: usize,
}

/// Executes unsubscribe actions against sender records.
#[derive(Debug)]
pub struct Unsubscriber<'a, A> {
    account: &'a A,
    http: reqwest::Client,
}

impl<'a, A: MailAccount> Unsubscriber<'a, A> {
    /// Creates an executor over the given mail account.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client for one-click POSTs cannot
    /// be built.
    pub fn new(account: &'a A) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(ONE_CLICK_TIMEOUT)
            .build()?;

        Ok(Self { account, http })
    }

    /// Applies the priority policy to one sender and performs the
    /// chosen action.
    ///
    /// Order: one-click POST, then automated mailto, then the manual
    /// link (reported as failure, for the operator), then "no valid
    /// method". A failed one-click falls through to mailto rather
    /// than returning.
    ///
    /// With `dry_run` set nothing is contacted: the outcome reports
    /// the method that would have been used, succeeding whenever any
    /// method exists.
    pub async fn execute(&self, record: &SenderRecord, dry_run: bool) -> Outcome {
        if dry_run {
            return Self::simulate(record);
        }

        if let Some(url) = &record.methods.one_click {
            match self.post_one_click(url).await {
                Ok(()) => {
                    return Outcome::success(format!("One-click unsubscribe accepted by {url}"));
                }
                Err(e) => {
                    warn!("One-click POST to {url} failed ({e}), falling back");
                }
            }
        }

        if let Some(target) = &record.methods.mailto {
            let subject = target.subject.as_deref().unwrap_or(DEFAULT_SUBJECT);
            return match self
                .account
                .send_message(&target.address, subject, DEFAULT_BODY)
                .await
            {
                Ok(()) => Outcome::success(format!("Unsubscribe email sent to {}", target.address)),
                Err(e) => Outcome::failure(format!(
                    "Failed to send unsubscribe email to {}: {e}",
                    target.address
                )),
            };
        }

        if let Some(link) = &record.methods.http {
            return Outcome::failure(format!("Manual action required, open: {link}"));
        }

        Outcome::failure("No valid unsubscribe method")
    }

    /// Unsubscribes a batch of senders, pacing successive attempts.
    ///
    /// Per-sender failures are reported through `on_outcome` and the
    /// batch continues. Dry-run batches skip the pacing delay.
    pub async fn execute_batch(
        &self,
        records: &[&SenderRecord],
        dry_run: bool,
        mut on_outcome: impl FnMut(&SenderRecord, &Outcome),
    ) -> BatchSummary {
        let mut summary = BatchSummary::default();

        for (i, record) in records.iter().enumerate() {
            if i > 0 && !dry_run {
                tokio::time::sleep(BATCH_PACING).await;
            }

            let outcome = self.execute(record, dry_run).await;
            if outcome.succeeded {
                summary.succeeded += 1;
            } else {
                summary.failed += 1;
            }
            on_outcome(record, &outcome);
        }

        summary
    }

    /// Dry-run outcome: names the method the policy resolves to.
    fn simulate(record: &SenderRecord) -> Outcome {
        match record.action() {
            UnsubscribeAction::OneClick(url) => {
                Outcome::success(format!("[dry-run] would POST one-click unsubscribe to {url}"))
            }
            UnsubscribeAction::Mailto(target) => Outcome::success(format!(
                "[dry-run] would send unsubscribe email to {}",
                target.address
            )),
            UnsubscribeAction::Manual(link) => {
                Outcome::success(format!("[dry-run] manual action required, open: {link}"))
            }
            UnsubscribeAction::NoMethod => Outcome::failure("No valid unsubscribe method"),
        }
    }

    /// Issues the RFC 8058 POST. Success iff the status is below 400.
    async fn post_one_click(&self, url: &str) -> Result<()> {
        debug!("POST {url} (one-click)");
        let response = self.http.post(url).form(&ONE_CLICK_FORM).send().await?;

        let status = response.status().as_u16();
        if status >= 400 {
            return Err(Error::OneClickRejected(status));
        }
        Ok(())
    }
}
