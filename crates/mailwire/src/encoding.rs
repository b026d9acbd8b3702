//! Header text encoding and decoding.
//!
//! Supports Base64 and RFC 2047 "encoded words" (`=?UTF-8?B?...?=`).

use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Charset label written into every encoded word.
const CHARSET: &str = "UTF-8";

/// Maximum length of a single encoded word (RFC 2047 section 2).
const MAX_ENCODED_WORD_LENGTH: usize = 75;

/// Source bytes that fit in one word: `=?UTF-8?B?` and `?=` take 12 of the
/// 75 characters, and 63 base64 characters carry 45 bytes.
const MAX_WORD_SOURCE_BYTES: usize =
    (MAX_ENCODED_WORD_LENGTH - "=?".len() - CHARSET.len() - "?B?".len() - "?=".len()) / 4 * 3;

/// RFC 5322 specials that force a display name into a quoted-string.
const SPECIALS: &str = "()<>[]:;@\\,.\"";

/// Encodes data as Base64.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decodes Base64 data.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    STANDARD.decode(data).map_err(Into::into)
}

/// Returns true if `text` cannot appear in a header as-is.
///
/// Printable ASCII and horizontal tab pass through unchanged.
#[must_use]
pub fn needs_encoding(text: &str) -> bool {
    text.bytes()
        .any(|b| !(b' '..=b'~').contains(&b) && b != b'\t')
}

/// Encodes header text as RFC 2047 "B" encoded words if needed.
///
/// Text that is printable ASCII is returned unchanged. Anything else is
/// encoded as UTF-8, split on character boundaries into words of at most
/// 75 characters separated by a single space.
#[must_use]
pub fn encode_word(text: &str) -> String {
    if !needs_encoding(text) {
        return text.to_string();
    }

    let mut encoded = String::with_capacity(text.len() * 2);
    let mut start = 0;
    let mut len = 0;
    for (i, ch) in text.char_indices() {
        let ch_len = ch.len_utf8();
        if len + ch_len > MAX_WORD_SOURCE_BYTES {
            push_word(&mut encoded, &text[start..i]);
            start = i;
            len = 0;
        }
        len += ch_len;
    }
    push_word(&mut encoded, &text[start..]);
    encoded
}

fn push_word(out: &mut String, chunk: &str) {
    if !out.is_empty() {
        out.push(' ');
    }
    out.push_str("=?");
    out.push_str(CHARSET);
    out.push_str("?B?");
    out.push_str(&encode_base64(chunk.as_bytes()));
    out.push_str("?=");
}

/// Encodes an address display name.
///
/// Non-ASCII names become encoded words. ASCII names containing specials
/// become a quoted-string so the address re-parses to the same mailbox.
#[must_use]
pub fn encode_display_name(name: &str) -> String {
    if name.is_empty() || needs_encoding(name) {
        return encode_word(name);
    }
    if !name.contains(|c| SPECIALS.contains(c)) {
        return name.to_string();
    }

    let mut quoted = String::with_capacity(name.len() + 2);
    quoted.push('"');
    for ch in name.chars() {
        if ch == '"' || ch == '\\' {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    quoted.push('"');
    quoted
}

/// Decodes a single RFC 2047 encoded word into raw bytes.
///
/// Returns `Ok(None)` if `token` is not shaped like an encoded word.
fn decode_word_bytes(token: &str) -> Result<Option<Vec<u8>>> {
    let Some(inner) = token
        .strip_prefix("=?")
        .and_then(|rest| rest.strip_suffix("?="))
    else {
        return Ok(None);
    };

    let parts: Vec<&str> = inner.split('?').collect();
    if parts.len() != 3 {
        return Ok(None);
    }

    let encoded_text = parts[2];
    match parts[1].to_ascii_uppercase().as_str() {
        "B" => decode_base64(encoded_text).map(Some),
        "Q" => decode_q(encoded_text).map(Some),
        other => Err(Error::InvalidEncoding(format!("Unknown encoding: {other}"))),
    }
}

/// Decodes the "Q" encoding: `_` is a space and `=XX` is a hex byte.
fn decode_q(text: &str) -> Result<Vec<u8>> {
    let mut result = Vec::with_capacity(text.len());
    let mut bytes = text.bytes();

    while let Some(byte) = bytes.next() {
        match byte {
            b'_' => result.push(b' '),
            b'=' => {
                let hex: Vec<u8> = bytes.by_ref().take(2).collect();
                if hex.len() != 2 {
                    return Err(Error::InvalidEncoding(
                        "Incomplete escape sequence".to_string(),
                    ));
                }
                let hex = std::str::from_utf8(&hex)
                    .map_err(|e| Error::InvalidEncoding(format!("Invalid hex: {e}")))?;
                let value = u8::from_str_radix(hex, 16)
                    .map_err(|e| Error::InvalidEncoding(format!("Invalid hex: {e}")))?;
                result.push(value);
            }
            _ => result.push(byte),
        }
    }

    Ok(result)
}

/// Decodes header text that may contain RFC 2047 encoded words.
///
/// Whitespace between adjacent encoded words is dropped, so text split by
/// [`encode_word`] decodes back to the original. Everything else is kept
/// as-is.
///
/// # Errors
///
/// Returns an error if an encoded word has an unknown encoding, invalid
/// payload, or does not decode to UTF-8.
pub fn decode_words(text: &str) -> Result<String> {
    let mut decoded = String::with_capacity(text.len());
    let mut pending: Vec<u8> = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        let trimmed = rest.trim_start();
        let whitespace = &rest[..rest.len() - trimmed.len()];
        let token_len = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
        let (token, tail) = trimmed.split_at(token_len);
        rest = tail;

        if token.is_empty() {
            flush_pending(&mut decoded, &mut pending)?;
            decoded.push_str(whitespace);
            break;
        }

        if let Some(bytes) = decode_word_bytes(token)? {
            if pending.is_empty() {
                decoded.push_str(whitespace);
            }
            pending.extend(bytes);
        } else {
            flush_pending(&mut decoded, &mut pending)?;
            decoded.push_str(whitespace);
            decoded.push_str(token);
        }
    }

    flush_pending(&mut decoded, &mut pending)?;
    Ok(decoded)
}

fn flush_pending(out: &mut String, pending: &mut Vec<u8>) -> Result<()> {
    if !pending.is_empty() {
        out.push_str(&String::from_utf8(std::mem::take(pending))?);
    }
    Ok(())
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_base64_encode_decode() {
        let data = b"Hello, World!";
        let encoded = encode_base64(data);
        assert_eq!(encoded, "SGVsbG8sIFdvcmxkIQ==");

        let decoded = decode_base64(&encoded).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_word_source_limit() {
        assert_eq!(MAX_WORD_SOURCE_BYTES, 45);
    }

    #[test]
    fn test_encode_word_ascii_passthrough() {
        assert_eq!(encode_word("Hello"), "Hello");
        assert_eq!(encode_word("a=?b?=c"), "a=?b?=c");
        assert_eq!(encode_word("tab\there"), "tab\there");
        assert_eq!(encode_word(""), "");
    }

    #[test]
    fn test_encode_word_non_ascii() {
        assert_eq!(encode_word("Héllo"), "=?UTF-8?B?SMOpbGxv?=");
    }

    #[test]
    fn test_encode_word_control_chars() {
        assert_eq!(encode_word("a\nb"), "=?UTF-8?B?YQpi?=");
    }

    #[test]
    fn test_encode_word_splits_long_text() {
        let text = "é".repeat(40);
        let encoded = encode_word(&text);
        let words: Vec<&str> = encoded.split(' ').collect();
        assert_eq!(words.len(), 2);
        for word in &words {
            assert!(word.len() <= MAX_ENCODED_WORD_LENGTH);
            assert!(word.starts_with("=?UTF-8?B?"));
            assert!(word.ends_with("?="));
        }
        assert_eq!(decode_words(&encoded).unwrap(), text);
    }

    #[test]
    fn test_encode_display_name() {
        assert_eq!(encode_display_name(""), "");
        assert_eq!(encode_display_name("John Doe"), "John Doe");
        assert_eq!(encode_display_name("Doe, John"), "\"Doe, John\"");
        assert_eq!(encode_display_name("say \"hi\""), "\"say \\\"hi\\\"\"");
        assert_eq!(encode_display_name("Jöhn"), "=?UTF-8?B?SsO2aG4=?=");
    }

    #[test]
    fn test_decode_words_plain() {
        assert_eq!(decode_words("Hello  World ").unwrap(), "Hello  World ");
    }

    #[test]
    fn test_decode_words_b() {
        assert_eq!(decode_words("=?utf-8?B?SMOpbGxv?=").unwrap(), "Héllo");
    }

    #[test]
    fn test_decode_words_q() {
        assert_eq!(decode_words("=?utf-8?Q?H=C3=A9llo_you?=").unwrap(), "Héllo you");
    }

    #[test]
    fn test_decode_words_mixed() {
        let decoded = decode_words("Re: =?UTF-8?B?SMOp?= =?UTF-8?B?bGxv?= there").unwrap();
        assert_eq!(decoded, "Re: Héllo there");
    }

    #[test]
    fn test_decode_words_unknown_encoding() {
        assert!(decode_words("=?utf-8?X?abc?=").is_err());
    }

    #[test]
    fn test_decode_words_incomplete_escape() {
        assert!(decode_words("=?utf-8?Q?abc=4?=").is_err());
    }

    proptest! {
        #[test]
        fn prop_printable_ascii_unchanged(text in "[ -~]*") {
            prop_assert_eq!(encode_word(&text), text);
        }

        #[test]
        fn prop_non_ascii_round_trips(text in "\\PC*[^\\x00-\\x7f]\\PC*") {
            let encoded = encode_word(&text);
            prop_assert!(encoded.starts_with("=?UTF-8?B?"));
            prop_assert!(encoded.ends_with("?="));
            prop_assert!(!needs_encoding(&encoded));
            for word in encoded.split(' ') {
                prop_assert!(word.len() <= MAX_ENCODED_WORD_LENGTH);
            }
            prop_assert_eq!(decode_words(&encoded).unwrap(), text);
        }
    }
}
