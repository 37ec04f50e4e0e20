//! # mailsweep-mime
//!
//! Mail header parsing for the mailsweep scanner.
//!
//! ## Features
//!
//! - **Header decoding**: RFC 2047 encoded-word decoding (B and Q),
//!   permissive on unknown charsets and malformed input
//! - **Sender extraction**: `From` header splitting into display name
//!   and canonical (lowercased) address
//! - **Unsubscribe methods**: `List-Unsubscribe` / `List-Unsubscribe-Post`
//!   parsing into mailto, HTTP, and RFC 8058 one-click candidates
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailsweep_mime::{Sender, UnsubscribeMethods};
//!
//! let sender = Sender::parse(Some("=?utf-8?Q?Caf=C3=A9?= <news@example.com>"));
//! assert_eq!(sender.address, "news@example.com");
//!
//! let methods = UnsubscribeMethods::parse(
//!     "<mailto:leave@example.com?subject=Remove%20me>, <https://example.com/u>",
//!     Some("List-Unsubscribe=One-Click"),
//! );
//! assert!(methods.one_click.is_some());
//! ```
//!
//! Decoding never fails: undecodable segments are replaced rather than
//! propagated as errors, so a single malformed header cannot abort a
//! mailbox scan.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
mod sender;
mod unsubscribe;

pub mod encoding;

pub use error::{Error, Result};
pub use sender::{Sender, UNKNOWN_SENDER};
pub use unsubscribe::{MailtoTarget, ONE_CLICK_MARKER, UnsubscribeMethods};
