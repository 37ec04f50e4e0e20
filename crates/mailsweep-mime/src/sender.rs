//! Sender identity extraction from the `From` header.

use crate::encoding::decode_header;

/// Placeholder identity used when a message carries no usable `From`
/// header. Never empty, so aggregation never keys on `""`.
pub const UNKNOWN_SENDER: &str = "Unknown";

/// A message sender: decoded display name plus canonical address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    /// Decoded human-readable name.
    pub display_name: String,
    /// Lowercased email address, the aggregation key.
    pub address: String,
}

impl Sender {
    /// Parses a raw `From` header value.
    ///
    /// The `Name <addr>` form splits into display name (trimmed,
    /// surrounding quotes stripped, RFC 2047 decoded) and bracketed
    /// address. Without angle brackets the whole value serves as both
    /// name and address. A missing or blank header yields the
    /// [`UNKNOWN_SENDER`] placeholder.
    ///
    /// The address is lowercased: mail domains are case-insensitive
    /// and senders routinely vary the case of the local part, which
    /// would otherwise split one sender across several records.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Self {
                display_name: UNKNOWN_SENDER.to_string(),
                address: UNKNOWN_SENDER.to_lowercase(),
            };
        };

        if let Some(open) = raw.find('<')
            && let Some(close) = raw[open + 1..].find('>')
        {
            let address = raw[open + 1..open + 1 + close].trim();
            let name = raw[..open].trim().trim_matches('"').trim();
            let display_name = decode_header(name);

            return Self {
                display_name: if display_name.trim().is_empty() {
                    address.to_string()
                } else {
                    display_name
                },
                address: address.to_lowercase(),
            };
        }

        // Degraded form: no angle brackets, use the value for both.
        let display_name = decode_header(raw);
        Self {
            display_name: if display_name.trim().is_empty() {
                raw.to_string()
            } else {
                display_name
            },
            address: raw.to_lowercase(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_name_and_address() {
        let sender = Sender::parse(Some("\"A. Sender\" <a@x.com>"));
        assert_eq!(sender.display_name, "A. Sender");
        assert_eq!(sender.address, "a@x.com");
    }

    #[test]
    fn test_address_lowercased() {
        let sender = Sender::parse(Some("News <News@Example.COM>"));
        assert_eq!(sender.address, "news@example.com");
        assert_eq!(sender.display_name, "News");
    }

    #[test]
    fn test_encoded_display_name() {
        let sender = Sender::parse(Some("=?utf-8?Q?Caf=C3=A9_Weekly?= <news@cafe.example>"));
        assert_eq!(sender.display_name, "Café Weekly");
        assert_eq!(sender.address, "news@cafe.example");
    }

    #[test]
    fn test_empty_name_falls_back_to_address() {
        let sender = Sender::parse(Some("<bare@example.com>"));
        assert_eq!(sender.display_name, "bare@example.com");
        assert_eq!(sender.address, "bare@example.com");
    }

    #[test]
    fn test_no_angle_brackets() {
        let sender = Sender::parse(Some("alerts@example.com"));
        assert_eq!(sender.display_name, "alerts@example.com");
        assert_eq!(sender.address, "alerts@example.com");
    }

    #[test]
    fn test_missing_header() {
        let sender = Sender::parse(None);
        assert_eq!(sender.display_name, "Unknown");
        assert_eq!(sender.address, "unknown");
    }

    #[test]
    fn test_blank_header() {
        let sender = Sender::parse(Some("   "));
        assert_eq!(sender.display_name, "Unknown");
        assert_eq!(sender.address, "unknown");
    }

    #[test]
    fn test_unclosed_bracket_degrades() {
        let sender = Sender::parse(Some("Broken <a@x.com"));
        assert_eq!(sender.address, "broken <a@x.com");
    }
}
