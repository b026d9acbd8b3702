//! Media type and disposition parsing (RFC 2045 section 5.1, RFC 2183).

use crate::error::{Error, Result};
use std::collections::BTreeMap;

/// Parameters attached to a media type, keyed by lowercase name.
pub type Parameters = BTreeMap<String, String>;

/// Parses a media type or disposition value and its parameters.
///
/// The type and parameter names are lowercased; quoted values are unquoted.
/// A bare token such as `attachment` is accepted, as in Content-Disposition.
///
/// # Errors
///
/// Returns [`Error::InvalidContentType`] on malformed input or duplicate
/// parameters.
pub fn parse_media_type(s: &str) -> Result<(String, Parameters)> {
    let invalid = |reason: &str| Error::InvalidContentType(format!("{reason}: {s}"));

    let (head, mut rest) = s.split_once(';').unwrap_or((s, ""));
    let media_type = head.trim().to_ascii_lowercase();
    let valid_type = match media_type.split_once('/') {
        Some((main, sub)) => is_token(main) && is_token(sub),
        None => is_token(&media_type),
    };
    if !valid_type {
        return Err(invalid("Invalid media type"));
    }

    let mut parameters = Parameters::new();
    loop {
        rest = rest.trim_start_matches(|c: char| c == ';' || c.is_ascii_whitespace());
        if rest.is_empty() {
            break;
        }

        let (key, after_key) = rest
            .split_once('=')
            .ok_or_else(|| invalid("Missing '=' in parameter"))?;
        let key = key.trim().to_ascii_lowercase();
        if !is_token(&key) {
            return Err(invalid("Invalid parameter name"));
        }

        let after_key = after_key.trim_start();
        let (value, after_value) = if after_key.starts_with('"') {
            consume_quoted(after_key).ok_or_else(|| invalid("Unclosed quoted parameter"))?
        } else {
            let end = after_key
                .find(|c: char| c == ';' || c.is_ascii_whitespace())
                .unwrap_or(after_key.len());
            (after_key[..end].to_string(), &after_key[end..])
        };

        let trailing = after_value.trim_start();
        if !trailing.is_empty() && !trailing.starts_with(';') {
            return Err(invalid("Unexpected text after parameter"));
        }
        if parameters.insert(key, value).is_some() {
            return Err(invalid("Duplicate parameter"));
        }
        rest = trailing;
    }

    Ok((media_type, parameters))
}

/// Consumes a quoted string, returning its unescaped content and the rest.
fn consume_quoted(s: &str) -> Option<(String, &str)> {
    let mut value = String::new();
    let mut escaped = false;
    for (i, ch) in s.char_indices().skip(1) {
        if escaped {
            value.push(ch);
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == '"' {
            return Some((value, &s[i + 1..]));
        } else {
            value.push(ch);
        }
    }
    None
}

/// RFC 2045 token: printable ASCII without spaces or tspecials.
fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s
            .bytes()
            .all(|b| b.is_ascii_graphic() && !b"()<>@,;:\\\"/[]?=".contains(&b))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_content_type() {
        let (media_type, params) = parse_media_type("Text/Plain; Charset=utf-8").unwrap();
        assert_eq!(media_type, "text/plain");
        assert_eq!(params.get("charset").map(String::as_str), Some("utf-8"));
    }

    #[test]
    fn test_parse_quoted_value() {
        let (media_type, params) =
            parse_media_type("multipart/mixed; boundary=\"----=_Part;123\"").unwrap();
        assert_eq!(media_type, "multipart/mixed");
        assert_eq!(params.get("boundary").map(String::as_str), Some("----=_Part;123"));
    }

    #[test]
    fn test_parse_escaped_value() {
        let (_, params) = parse_media_type("text/plain; name=\"a\\\"b\"").unwrap();
        assert_eq!(params.get("name").map(String::as_str), Some("a\"b"));
    }

    #[test]
    fn test_parse_disposition() {
        let (kind, params) = parse_media_type("attachment; filename=\"a b.txt\"").unwrap();
        assert_eq!(kind, "attachment");
        assert_eq!(params.get("filename").map(String::as_str), Some("a b.txt"));
    }

    #[test]
    fn test_parse_no_parameters() {
        let (kind, params) = parse_media_type("  inline  ").unwrap();
        assert_eq!(kind, "inline");
        assert!(params.is_empty());
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse_media_type("").is_err());
        assert!(parse_media_type("text/").is_err());
        assert!(parse_media_type("text/plain; charset").is_err());
        assert!(parse_media_type("text/plain; a=1; a=2").is_err());
        assert!(parse_media_type("text/plain; a=\"open").is_err());
        assert!(parse_media_type("text/plain; a=1 b").is_err());
    }
}
