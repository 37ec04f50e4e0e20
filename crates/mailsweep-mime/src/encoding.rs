//! RFC 2047 encoded-word decoding.
//!
//! Mail headers carry non-ASCII text as encoded words of the form
//! `=?charset?encoding?encoded-text?=`. This module decodes them
//! permissively: malformed words pass through verbatim and undecodable
//! bytes are replaced, so header decoding never fails.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use encoding_rs::{Encoding, UTF_8};

/// Decodes a header value containing RFC 2047 encoded words.
///
/// Plain text runs pass through unchanged. Each well-formed encoded
/// word is decoded with its declared charset and encoding; whitespace
/// between two adjacent encoded words is transparent (RFC 2047 §6.2),
/// so consecutive words concatenate with no added separators.
///
/// Unknown charsets decode as UTF-8 with replacement, and a word whose
/// encoded text is invalid is emitted verbatim.
#[must_use]
pub fn decode_header(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    let mut prev_encoded = false;

    while let Some(start) = rest.find("=?") {
        let (before, candidate) = rest.split_at(start);

        if let Some((decoded, consumed)) = decode_encoded_word(candidate) {
            // Whitespace separating two encoded words carries no meaning.
            if !(prev_encoded && before.chars().all(char::is_whitespace)) {
                out.push_str(before);
            }
            out.push_str(&decoded);
            rest = &candidate[consumed..];
            prev_encoded = true;
        } else {
            // Not a valid encoded word; emit the marker literally.
            out.push_str(before);
            out.push_str("=?");
            rest = &candidate[2..];
            prev_encoded = false;
        }
    }

    out.push_str(rest);
    out
}

/// Attempts to decode one encoded word at the start of `s`.
///
/// Returns the decoded text and the number of bytes consumed, or
/// `None` if `s` does not start with a well-formed encoded word.
fn decode_encoded_word(s: &str) -> Option<(String, usize)> {
    let inner = s.strip_prefix("=?")?;
    let (charset, rest) = inner.split_once('?')?;
    let (encoding, rest) = rest.split_once('?')?;
    let (text, _) = rest.split_once("?=")?;

    // An encoded word is a single token; whitespace means we matched
    // across unrelated text.
    if charset.contains(char::is_whitespace)
        || encoding.contains(char::is_whitespace)
        || text.contains(char::is_whitespace)
    {
        return None;
    }

    let bytes = match encoding {
        "B" | "b" => STANDARD.decode(text).ok()?,
        "Q" | "q" => decode_q(text),
        _ => return None,
    };

    let consumed = 2 + charset.len() + 1 + encoding.len() + 1 + text.len() + 2;

    // RFC 2231 allows a language suffix after '*' in the charset.
    let charset = charset.split('*').next().unwrap_or(charset);
    let decoded = decode_charset(charset, &bytes);

    Some((decoded, consumed))
}

/// Decodes bytes with the named charset, replacing undecodable
/// sequences. Unknown charset labels fall back to UTF-8.
fn decode_charset(charset: &str, bytes: &[u8]) -> String {
    let encoding = Encoding::for_label(charset.as_bytes()).unwrap_or(UTF_8);
    let (decoded, _, _) = encoding.decode(bytes);
    decoded.into_owned()
}

/// Decodes Q-encoded text (RFC 2047 §4.2).
///
/// `_` decodes to space and `=XX` to the byte `0xXX`; malformed escape
/// sequences are kept literally.
fn decode_q(text: &str) -> Vec<u8> {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'_' => {
                out.push(b' ');
                i += 1;
            }
            b'=' => {
                if let Some(byte) = bytes
                    .get(i + 1..i + 3)
                    .and_then(|hex| std::str::from_utf8(hex).ok())
                    .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                {
                    out.push(byte);
                    i += 3;
                } else {
                    out.push(b'=');
                    i += 1;
                }
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }

    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_passthrough() {
        assert_eq!(decode_header("Hello, World!"), "Hello, World!");
        assert_eq!(decode_header(""), "");
    }

    #[test]
    fn test_base64_word() {
        assert_eq!(decode_header("=?utf-8?B?SMOpbGxv?="), "Héllo");
    }

    #[test]
    fn test_q_word() {
        assert_eq!(decode_header("=?utf-8?Q?H=C3=A9llo?="), "Héllo");
        assert_eq!(decode_header("=?utf-8?Q?Hello_World?="), "Hello World");
    }

    #[test]
    fn test_adjacent_words_concatenate() {
        // Whitespace between encoded words is transparent.
        assert_eq!(
            decode_header("=?utf-8?Q?Hello?= =?utf-8?Q?World?="),
            "HelloWorld"
        );
    }

    #[test]
    fn test_mixed_plain_and_encoded() {
        assert_eq!(
            decode_header("Newsletter =?utf-8?Q?caf=C3=A9?= weekly"),
            "Newsletter café weekly"
        );
    }

    #[test]
    fn test_latin1_charset() {
        // 0xE9 is 'é' in ISO-8859-1.
        assert_eq!(decode_header("=?iso-8859-1?Q?caf=E9?="), "café");
    }

    #[test]
    fn test_unknown_charset_falls_back() {
        let decoded = decode_header("=?x-no-such-charset?Q?caf=C3=A9?=");
        assert_eq!(decoded, "café");
    }

    #[test]
    fn test_undecodable_bytes_replaced() {
        // 0xFF is not valid UTF-8; decoding must not fail.
        let decoded = decode_header("=?utf-8?Q?a=FFb?=");
        assert_eq!(decoded, "a\u{fffd}b");
    }

    #[test]
    fn test_malformed_word_kept_verbatim() {
        assert_eq!(decode_header("=?utf-8?X?abc?="), "=?utf-8?X?abc?=");
        assert_eq!(decode_header("price =? value"), "price =? value");
    }

    #[test]
    fn test_invalid_base64_kept_verbatim() {
        assert_eq!(decode_header("=?utf-8?B?!!!?="), "=?utf-8?B?!!!?=");
    }

    #[test]
    fn test_q_malformed_escape_kept() {
        assert_eq!(decode_header("=?utf-8?Q?a=ZZb?="), "a=ZZb");
    }
}
