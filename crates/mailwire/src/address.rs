//! Email address list parsing (RFC 5322 section 3.4).

use crate::encoding::decode_words;
use crate::error::{Error, Result};
use mailparse::{MailAddr, SingleInfo};
use std::fmt;

/// A mailbox with an optional display name.
///
/// Addresses are never stored in a header; they are parsed from the raw
/// field text each time they are needed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Address {
    /// Display name (decoded), if any.
    pub name: Option<String>,
    /// Mailbox in `local@domain` form.
    pub address: String,
}

impl Address {
    /// Creates an address without a display name.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            name: None,
            address: address.into(),
        }
    }

    /// Creates an address with a display name.
    #[must_use]
    pub fn with_name(name: impl Into<String>, address: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            name: (!name.is_empty()).then_some(name),
            address: address.into(),
        }
    }

    /// Returns the display name, or an empty string.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name} <{}>", self.address),
            None => write!(f, "{}", self.address),
        }
    }
}

/// Parses a comma-separated address list.
///
/// Groups are flattened into their members, so `team: a@x.com, b@x.com;`
/// yields two addresses. An empty group yields none. Encoded-word display
/// names are decoded.
///
/// # Errors
///
/// Returns [`Error::InvalidAddress`] if the text is not an address list,
/// e.g. free text such as a subject line.
pub fn parse_address_list(text: &str) -> Result<Vec<Address>> {
    let list = mailparse::addrparse(text)
        .map_err(|e| Error::InvalidAddress(format!("{text:?}: {e}")))?;

    let mut addresses = Vec::new();
    let mut saw_group = false;
    for entry in list.iter() {
        match entry {
            MailAddr::Single(info) => addresses.push(to_address(info)?),
            MailAddr::Group(group) => {
                saw_group = true;
                for info in &group.addrs {
                    addresses.push(to_address(info)?);
                }
            }
        }
    }

    if addresses.is_empty() && !saw_group {
        return Err(Error::InvalidAddress(format!("{text:?}: no address")));
    }
    Ok(addresses)
}

/// Converts a parsed mailbox, rejecting words that are not `local@domain`.
fn to_address(info: &SingleInfo) -> Result<Address> {
    let address = info.addr.trim();
    if !is_mailbox(address) {
        return Err(Error::InvalidAddress(format!("not a mailbox: {address:?}")));
    }

    let name = match info.display_name.as_deref().map(str::trim) {
        Some(name) if name.contains("=?") => decode_words(name)?,
        Some(name) => name.to_string(),
        None => String::new(),
    };
    Ok(Address::with_name(name, address))
}

/// Free text such as `Hi` parses as a bare mailbox, so require both halves
/// of an addr-spec and no embedded whitespace or brackets.
fn is_mailbox(address: &str) -> bool {
    address
        .rsplit_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty())
        && !address.contains(|c: char| c.is_whitespace() || matches!(c, '<' | '>' | ',' | ';'))
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

    #[test]
    fn test_single_addr_spec() {
        let list = parse_address_list("user@example.com").unwrap();
        assert_eq!(list, vec![Address::new("user@example.com")]);
    }

    #[test]
    fn test_multiple_addresses() {
        let list = parse_address_list("b@x.com, c@x.com").unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].address, "b@x.com");
        assert_eq!(list[1].address, "c@x.com");
    }

    #[test]
    fn test_name_addr() {
        let list = parse_address_list("John Doe <john@example.com>").unwrap();
        assert_eq!(list[0].name.as_deref(), Some("John Doe"));
        assert_eq!(list[0].address, "john@example.com");
    }

    #[test]
    fn test_quoted_display_name() {
        let list = parse_address_list("\"Doe, John\" <john@example.com>, a@b.c").unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].name(), "Doe, John");
        assert_eq!(list[1], Address::new("a@b.c"));
    }

    #[test]
    fn test_encoded_display_name() {
        let list = parse_address_list("=?UTF-8?B?SsO2aG4=?= <j@example.com>").unwrap();
        assert_eq!(list[0].name(), "Jöhn");
    }

    #[test]
    fn test_angle_addr_without_name() {
        let list = parse_address_list("<a@b.c>").unwrap();
        assert_eq!(list[0], Address::new("a@b.c"));
    }

    #[test]
    fn test_group_flattened() {
        let list = parse_address_list("team: a@x.com, b@x.com;").unwrap();
        let addrs: Vec<&str> = list.iter().map(|a| a.address.as_str()).collect();
        assert_eq!(addrs, vec!["a@x.com", "b@x.com"]);
    }

    #[test]
    fn test_empty_group() {
        let list = parse_address_list("undisclosed-recipients:;").unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn test_plain_text_rejected() {
        assert!(parse_address_list("Hi").is_err());
        assert!(parse_address_list("Hello there, friend").is_err());
        assert!(parse_address_list("19 Oct 26 10:00 +0000").is_err());
        assert!(parse_address_list("Mon, 02 Jan 2006 15:04:05 -0700").is_err());
        assert!(parse_address_list("").is_err());
    }

    #[test]
    fn test_incomplete_mailbox_rejected() {
        assert!(parse_address_list("a@").is_err());
        assert!(parse_address_list("@x.com").is_err());
        assert!(parse_address_list("a@x.com, nobody").is_err());
    }

    #[test]
    fn test_errors_are_parse_errors() {
        let err = parse_address_list("Hi").unwrap_err();
        assert!(matches!(err, Error::InvalidAddress(_)));
        assert!(err.is_parse());
    }

    #[test]
    fn test_display() {
        assert_eq!(Address::new("a@b.c").to_string(), "a@b.c");
        assert_eq!(Address::with_name("A", "a@b.c").to_string(), "A <a@b.c>");
        assert_eq!(Address::with_name("", "a@b.c").name, None);
    }
}
