//! # mailsweep-core
//!
//! Core scanning and unsubscribe policy engine for mailsweep.
//!
//! This crate provides:
//! - The scan driver: bounded-concurrency header fetches over a mail
//!   account, folded per sender in listing order
//! - Per-sender aggregation (occurrence counts, first-found methods)
//! - Selection: frequency-threshold filtering and ranking
//! - The unsubscribe executor: one-click POST with mailto fallback,
//!   manual-link reporting, dry-run simulation, paced batch mode
//! - The [`MailAccount`] trait seam the Gmail collaborator implements
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::atomic::AtomicBool;
//! use mailsweep_core::{ScanOptions, Unsubscriber, scan, select};
//!
//! let abort = AtomicBool::new(false);
//! let result = scan(&account, &ScanOptions::default(), &abort, |done, total| {
//!     eprint!("\rScanning: {done}/{total}");
//! })
//! .await?;
//!
//! let ranked = select(&result, 6);
//! let unsubscriber = Unsubscriber::new(&account)?;
//! for record in &ranked {
//!     let outcome = unsubscriber.execute(record, false).await;
//!     println!("{}: {}", record.display_name, outcome.message);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod account;
mod aggregate;
mod error;
mod execute;
mod model;
mod scan;
mod select;

pub use account::{MailAccount, SCAN_HEADERS};
pub use aggregate::Aggregator;
pub use error::{Error, Result};
pub use execute::{BatchSummary, Outcome, Unsubscriber};
pub use model::{MessageHeaderSet, ScanResult, SenderRecord, UnsubscribeAction};
pub use scan::{ScanOptions, scan};
pub use select::{select, select_automatable};

pub use mailsweep_mime::{MailtoTarget, Sender, UnsubscribeMethods};
