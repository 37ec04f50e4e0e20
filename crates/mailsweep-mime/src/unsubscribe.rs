//! `List-Unsubscribe` header parsing (RFC 2369 / RFC 8058).

use crate::error::{Error, Result};
use url::Url;

/// Literal marker a sender must place in `List-Unsubscribe-Post` to
/// advertise RFC 8058 one-click support.
pub const ONE_CLICK_MARKER: &str = "List-Unsubscribe=One-Click";

/// Target of a `mailto:` unsubscribe candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailtoTarget {
    /// Recipient address, exactly as given in the URI.
    pub address: String,
    /// Decoded `subject=` query parameter, if present.
    pub subject: Option<String>,
}

impl MailtoTarget {
    /// Parses a `mailto:` URI into address and optional subject.
    ///
    /// The subject is decoded as form data, so both `%20` and `+`
    /// become spaces.
    ///
    /// # Errors
    ///
    /// Returns an error if the URI does not parse, is not a `mailto:`
    /// URI, or names no address.
    pub fn parse(uri: &str) -> Result<Self> {
        let url = Url::parse(uri).map_err(|e| Error::InvalidMailto(e.to_string()))?;

        if url.scheme() != "mailto" {
            return Err(Error::NotMailto(url.scheme().to_string()));
        }

        let address = url.path().to_string();
        if address.is_empty() {
            return Err(Error::MissingAddress);
        }

        let subject = url
            .query_pairs()
            .find(|(key, _)| key.eq_ignore_ascii_case("subject"))
            .map(|(_, value)| value.into_owned());

        Ok(Self { address, subject })
    }
}

/// Unsubscribe candidates parsed from one message's headers.
///
/// At most one candidate of each kind; all-absent is a valid value
/// and means the message advertised nothing usable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnsubscribeMethods {
    /// Automated email target.
    pub mailto: Option<MailtoTarget>,
    /// Manual HTTP(S) link.
    pub http: Option<String>,
    /// RFC 8058 one-click POST endpoint.
    pub one_click: Option<String>,
}

impl UnsubscribeMethods {
    /// Parses the `List-Unsubscribe` header, with the optional
    /// `List-Unsubscribe-Post` companion header.
    ///
    /// The header is a comma-separated list of URIs, each optionally
    /// wrapped in angle brackets. The first parseable `mailto:` entry
    /// and the first `http`-scheme entry win; later duplicates are
    /// ignored. The HTTP candidate doubles as the one-click endpoint
    /// only when the companion header carries [`ONE_CLICK_MARKER`].
    ///
    /// Empty or malformed input yields an all-absent value, never an
    /// error.
    #[must_use]
    pub fn parse(list_unsubscribe: &str, post_header: Option<&str>) -> Self {
        let mut mailto = None;
        let mut http = None;

        for entry in list_unsubscribe.split(',') {
            let candidate = strip_angle_brackets(entry.trim());
            if candidate.is_empty() {
                continue;
            }

            if candidate.starts_with("mailto:") {
                if mailto.is_none() {
                    mailto = MailtoTarget::parse(candidate).ok();
                }
            } else if candidate.starts_with("http") && http.is_none() {
                http = Some(candidate.to_string());
            }
        }

        let one_click = match (post_header, &http) {
            (Some(post), Some(url)) if post.contains(ONE_CLICK_MARKER) => Some(url.clone()),
            _ => None,
        };

        Self {
            mailto,
            http,
            one_click,
        }
    }

    /// Returns true if no candidate of any kind was found.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.mailto.is_none() && self.http.is_none() && self.one_click.is_none()
    }

    /// Returns true if an automated mechanism (one-click or mailto)
    /// is available.
    #[must_use]
    pub const fn is_automatable(&self) -> bool {
        self.one_click.is_some() || self.mailto.is_some()
    }
}

/// Strips one leading `<` and one trailing `>`, only when both are
/// present.
fn strip_angle_brackets(s: &str) -> &str {
    s.strip_prefix('<')
        .and_then(|inner| inner.strip_suffix('>'))
        .map_or(s, str::trim)
}
