//! Message header fields and their wire serialization.
//!
//! Header fields are stored under a canonical name and written out in
//! lexicographic order of that name, one line (plus folds) per value.
//!
//! A [`Header`] has no internal synchronization. Give each in-flight
//! message its own header, or guard shared access with a lock.

use crate::address::{Address, parse_address_list};
use crate::config::HeaderConfig;
use crate::content_type::{Parameters, parse_media_type};
use crate::encoding::{encode_display_name, encode_word};
use crate::error::{Error, Result};
use crate::id::{Entropy, IdGenerator, Identity};
use crate::stream::LineFoldingWriter;
use chrono::{DateTime, FixedOffset};
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;

/// Field never written to the wire.
const BCC: &str = "Bcc";

/// Fields holding message identifiers, written verbatim rather than as
/// address lists so their angle brackets survive.
const MSG_ID_FIELDS: [&str; 5] = [
    "Message-Id",
    "Content-Id",
    "In-Reply-To",
    "References",
    "Resent-Message-Id",
];

/// Layout `save` uses for the Date field (RFC 822 with a numeric zone).
const SAVE_DATE_FORMAT: &str = "%d %b %y %H:%M %z";

/// Fallback layouts for dates chrono's RFC 2822 parser rejects.
const DATE_FORMATS: [&str; 3] = [
    "%d %b %y %H:%M %z",
    "%a, %d %b %y %H:%M %z",
    "%d %b %Y %H:%M %z",
];

/// Returns the canonical capitalization of a header field name.
///
/// The first letter and every letter after a hyphen are uppercased and the
/// rest lowercased (`content-type` becomes `Content-Type`), except for
/// `MIME-Version`. Names containing bytes that are not valid in a field
/// name are returned unchanged.
#[must_use]
pub fn canonical_key(key: &str) -> String {
    if !key.bytes().all(is_field_name_byte) {
        return key.to_string();
    }
    if key.eq_ignore_ascii_case("mime-version") {
        return "MIME-Version".to_string();
    }

    let mut upper = true;
    key.bytes()
        .map(|b| {
            let c = if upper {
                b.to_ascii_uppercase()
            } else {
                b.to_ascii_lowercase()
            };
            upper = b == b'-';
            char::from(c)
        })
        .collect()
}

const fn is_field_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' | b'^' | b'_'
                | b'`' | b'|' | b'~'
        )
}

/// Collection of message header fields.
///
/// Every field present holds at least one value; values keep insertion
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Header {
    fields: BTreeMap<String, Vec<String>>,
}

impl Header {
    /// Creates a new empty header.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a header for the common case: a sender, a subject and any
    /// number of recipients.
    #[must_use]
    pub fn for_message<S: AsRef<str>>(from: &str, subject: &str, to: &[S]) -> Self {
        let mut header = Self::new();
        header.set_subject(subject);
        header.set_from(from);
        if !to.is_empty() {
            header.set_to(to);
        }
        header
    }

    /// Appends a value to a field, keeping existing values.
    pub fn add(&mut self, key: &str, value: impl Into<String>) {
        self.fields
            .entry(canonical_key(key))
            .or_default()
            .push(value.into());
    }

    /// Sets a field to a single value, replacing existing values.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.fields.insert(canonical_key(key), vec![value.into()]);
    }

    /// Gets the first value of a field, or an empty string if absent.
    #[must_use]
    pub fn get(&self, key: &str) -> &str {
        self.get_all(key).first().map_or("", String::as_str)
    }

    /// Gets all values of a field in insertion order.
    #[must_use]
    pub fn get_all(&self, key: &str) -> &[String] {
        self.fields
            .get(&canonical_key(key))
            .map_or(&[], Vec::as_slice)
    }

    /// Returns true if the field is present.
    #[must_use]
    pub fn is_set(&self, key: &str) -> bool {
        self.fields.contains_key(&canonical_key(key))
    }

    /// Removes a field and all its values.
    pub fn remove(&mut self, key: &str) {
        self.fields.remove(&canonical_key(key));
    }

    /// Returns the number of distinct fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if no field is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns an iterator over `(name, value)` pairs in wire order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .flat_map(|(name, values)| values.iter().map(move |v| (name.as_str(), v.as_str())))
    }

    fn require(&self, key: &str) -> Result<&str> {
        match self.get(key) {
            "" => Err(Error::MissingField(canonical_key(key))),
            value => Ok(value),
        }
    }

    /// Parses the Date field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] if there is no Date, or
    /// [`Error::InvalidDate`] if it cannot be parsed.
    pub fn date(&self) -> Result<DateTime<FixedOffset>> {
        parse_date(self.require("Date")?)
    }

    /// Parses a field as an address list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] if the field is absent, or
    /// [`Error::InvalidAddress`] if it is not an address list.
    pub fn address_list(&self, key: &str) -> Result<Vec<Address>> {
        parse_address_list(self.require(key)?)
    }

    /// Parses the Content-Type field into a media type and its parameters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] if the field is absent, or
    /// [`Error::InvalidContentType`] if it is malformed.
    pub fn content_type(&self) -> Result<(String, Parameters)> {
        parse_media_type(self.require("Content-Type")?)
    }

    /// Parses the Content-Disposition field into a disposition and its parameters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] if the field is absent, or
    /// [`Error::InvalidContentType`] if it is malformed.
    pub fn content_disposition(&self) -> Result<(String, Parameters)> {
        parse_media_type(self.require("Content-Disposition")?)
    }

    /// Fills in the fields required to send a message.
    ///
    /// Adds a Message-Id and a Date if they are missing and sets
    /// MIME-Version to `1.0`. Calling it again leaves an existing
    /// Message-Id and Date untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IdGeneration`] if a Message-Id cannot be created.
    pub fn save(&mut self) -> Result<()> {
        self.save_with(&IdGenerator::system())
    }

    /// Like [`save`](Self::save), generating the Message-Id with `generator`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IdGeneration`] if a Message-Id cannot be created.
    pub fn save_with<I: Identity, E: Entropy>(
        &mut self,
        generator: &IdGenerator<I, E>,
    ) -> Result<()> {
        if self.get("Message-Id").is_empty() {
            let id = generator.message_id()?;
            self.set("Message-Id", format!("<{id}>"));
        }
        if self.get("Date").is_empty() {
            let now = chrono::Local::now();
            self.set("Date", now.format(SAVE_DATE_FORMAT).to_string());
        }
        self.set("MIME-Version", "1.0");
        Ok(())
    }

    /// Serializes the header with the default configuration.
    ///
    /// # Errors
    ///
    /// Never fails in practice; writing to a vector cannot fail.
    pub fn bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(buffer)
    }

    /// Writes every field except Bcc, returning the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Write`] with the bytes written so far if the sink fails.
    pub fn write_to<W: Write>(&self, w: W) -> Result<u64> {
        self.write_to_with(w, &HeaderConfig::default())
    }

    /// Writes every field except Bcc using `config`.
    ///
    /// Address-list fields are written as comma-separated, individually
    /// encoded mailboxes; other values are written as text, with RFC 2047
    /// encoded words where needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Write`] with the bytes written so far if the sink fails.
    pub fn write_to_with<W: Write>(&self, w: W, config: &HeaderConfig) -> Result<u64> {
        let mut writer = LineFoldingWriter::with_config(w, config);
        let line_ending = config.line_ending.as_str();

        for (field, values) in &self.fields {
            if field == BCC {
                continue;
            }
            for value in values {
                writer.reset_line();
                tracing::trace!(%field, "writing header field");
                writer
                    .write_unbroken(format!("{field}: ").as_bytes())
                    .map_err(|e| Error::write(writer.bytes_written(), e))?;
                // the whole value in one chunk, so every fold point is visible
                put(&mut writer, &encode_value(field, value))?;
                put(&mut writer, line_ending)?;
            }
        }

        Ok(writer.bytes_written())
    }

    /// Gets the From field.
    #[must_use]
    pub fn from(&self) -> &str {
        self.get("From")
    }

    /// Sets the From field.
    pub fn set_from(&mut self, email: &str) {
        self.set("From", email);
    }

    /// Gets the Subject field.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.get("Subject")
    }

    /// Sets the Subject field.
    pub fn set_subject(&mut self, subject: &str) {
        self.set("Subject", subject);
    }

    /// Gets the To recipients.
    #[must_use]
    pub fn to(&self) -> Vec<String> {
        self.list("To")
    }

    /// Sets the To recipients.
    pub fn set_to<S: AsRef<str>>(&mut self, emails: &[S]) {
        self.set("To", join_list(emails));
    }

    /// Gets the Cc recipients.
    #[must_use]
    pub fn cc(&self) -> Vec<String> {
        self.list("Cc")
    }

    /// Sets the Cc recipients.
    pub fn set_cc<S: AsRef<str>>(&mut self, emails: &[S]) {
        self.set("Cc", join_list(emails));
    }

    /// Gets the Bcc recipients. They are kept here but never serialized.
    #[must_use]
    pub fn bcc(&self) -> Vec<String> {
        self.list(BCC)
    }

    /// Sets the Bcc recipients.
    pub fn set_bcc<S: AsRef<str>>(&mut self, emails: &[S]) {
        self.set(BCC, join_list(emails));
    }

    fn list(&self, key: &str) -> Vec<String> {
        match self.get(key) {
            "" => Vec::new(),
            value => value.split(", ").map(String::from).collect(),
        }
    }
}

fn join_list<S: AsRef<str>>(emails: &[S]) -> String {
    emails
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<&str>>()
        .join(", ")
}

fn put<W: Write>(writer: &mut LineFoldingWriter<W>, text: &str) -> Result<()> {
    writer
        .write_all(text.as_bytes())
        .map_err(|e| Error::write(writer.bytes_written(), e))
}

/// Encodes a field value as an address list if it parses as one, else as text.
fn encode_value(field: &str, value: &str) -> String {
    if MSG_ID_FIELDS.contains(&field) {
        return encode_word(value);
    }

    match parse_address_list(value) {
        Ok(addresses) if !addresses.is_empty() => addresses
            .iter()
            .map(encode_address)
            .collect::<Vec<String>>()
            .join(", "),
        Ok(_) | Err(_) => {
            tracing::debug!(%field, "value is not an address list, writing as text");
            encode_word(value)
        }
    }
}

/// Encodes an address as `name <mailbox>`, or the bare mailbox without a name.
fn encode_address(address: &Address) -> String {
    let name = encode_display_name(address.name());
    let mailbox = if name.is_empty() {
        address.address.clone()
    } else {
        format!(" <{}>", address.address)
    };
    name + &encode_word(&mailbox)
}

fn parse_date(value: &str) -> Result<DateTime<FixedOffset>> {
    let value = value.trim();
    DateTime::parse_from_rfc2822(value).or_else(|err| {
        DATE_FORMATS
            .iter()
            .find_map(|format| DateTime::parse_from_str(value, format).ok())
            .ok_or_else(|| Error::InvalidDate(format!("{value:?}: {err}")))
    })
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.bytes().map_err(|_| fmt::Error)?;
        f.write_str(&String::from_utf8_lossy(&bytes))
    }
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
    use crate::encoding::decode_words;
    use crate::id::FixedIdentity;
    use chrono::{Datelike, Timelike};
    use proptest::prelude::*;
    use rand::rngs::OsRng;
    use std::io;

    fn to_string(header: &Header) -> String {
        String::from_utf8(header.bytes().unwrap()).unwrap()
    }

    /// Sink that fails after accepting `limit` bytes.
    struct FailingSink {
        accepted: usize,
        limit: usize,
    }

    impl Write for FailingSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.accepted + buf.len() > self.limit {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"));
            }
            self.accepted += buf.len();
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_canonical_key() {
        assert_eq!(canonical_key("content-type"), "Content-Type");
        assert_eq!(canonical_key("CONTENT-TYPE"), "Content-Type");
        assert_eq!(canonical_key("message-id"), "Message-Id");
        assert_eq!(canonical_key("mime-version"), "MIME-Version");
        assert_eq!(canonical_key("Mime-Version"), "MIME-Version");
        assert_eq!(canonical_key("x-mailer"), "X-Mailer");
        assert_eq!(canonical_key("bad key"), "bad key");
        assert_eq!(canonical_key(""), "");
    }

    #[test]
    fn test_add_get() {
        let mut header = Header::new();
        header.add("Received", "first");
        header.add("received", "second");
        assert_eq!(header.get("RECEIVED"), "first");
        assert_eq!(header.get_all("Received"), ["first", "second"]);
        assert_eq!(header.len(), 1);
    }

    #[test]
    fn test_set_replaces() {
        let mut header = Header::new();
        header.add("To", "alice@example.com");
        header.add("To", "bob@example.com");
        header.set("to", "charlie@example.com");
        assert_eq!(header.get_all("To"), ["charlie@example.com"]);
    }

    #[test]
    fn test_get_missing() {
        let header = Header::new();
        assert_eq!(header.get("Subject"), "");
        assert!(header.get_all("Subject").is_empty());
        assert!(!header.is_set("Subject"));
    }

    #[test]
    fn test_remove() {
        let mut header = Header::new();
        header.add("Subject", "Test");
        assert!(header.is_set("subject"));
        header.remove("SUBJECT");
        assert!(!header.is_set("Subject"));
        assert!(header.is_empty());
    }

    #[test]
    fn test_for_message() {
        let header = Header::for_message("a@x.com", "Hi", &["b@x.com", "c@x.com"]);
        assert_eq!(header.from(), "a@x.com");
        assert_eq!(header.subject(), "Hi");
        assert_eq!(header.to(), vec!["b@x.com", "c@x.com"]);

        let header = Header::for_message::<&str>("a@x.com", "Hi", &[]);
        assert!(!header.is_set("To"));
        assert!(header.to().is_empty());
    }

    #[test]
    fn test_list_accessors() {
        let mut header = Header::new();
        header.set_cc(&["a@x.com"]);
        header.set_bcc(&["secret@x.com", "hidden@x.com"]);
        assert_eq!(header.cc(), vec!["a@x.com"]);
        assert_eq!(header.bcc(), vec!["secret@x.com", "hidden@x.com"]);
    }

    #[test]
    fn test_save_sets_fields() {
        let generator = IdGenerator::new(FixedIdentity::new("mail.example.com", 7), OsRng);
        let mut header = Header::new();
        header.set("MIME-Version", "2.0");
        header.save_with(&generator).unwrap();

        let id = header.get("Message-Id");
        assert!(id.starts_with('<'));
        assert!(id.ends_with("@mail.example.com>"));
        assert!(header.date().is_ok());
        assert_eq!(header.get("mime-version"), "1.0");
    }

    #[test]
    fn test_save_propagates_entropy_failure() {
        struct BrokenEntropy;

        impl Entropy for BrokenEntropy {
            fn try_fill(&self, _dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
                Err(rand::Error::new(io::Error::other("no entropy")))
            }
        }

        let generator = IdGenerator::new(FixedIdentity::new("h", 1), BrokenEntropy);
        let mut header = Header::for_message("a@x.com", "Hi", &["b@x.com"]);
        let result = header.save_with(&generator);

        assert!(matches!(result, Err(Error::IdGeneration(_))));
        assert!(!header.is_set("Message-Id"));
    }

    #[test]
    fn test_save_is_idempotent() {
        let mut header = Header::new();
        header.save().unwrap();
        let id = header.get("Message-Id").to_string();
        let date = header.get("Date").to_string();

        header.save().unwrap();
        assert_eq!(header.get("Message-Id"), id);
        assert_eq!(header.get("Date"), date);
    }

    #[test]
    fn test_save_keeps_existing_values() {
        let mut header = Header::new();
        header.set("Message-Id", "<custom@host>");
        header.set("Date", "Mon, 02 Jan 2006 15:04:05 -0700");
        header.save().unwrap();
        assert_eq!(header.get("Message-Id"), "<custom@host>");
        assert_eq!(header.get("Date"), "Mon, 02 Jan 2006 15:04:05 -0700");
    }

    #[test]
    fn test_date_parse() {
        let mut header = Header::new();
        header.set("Date", "Mon, 02 Jan 2006 15:04:05 -0700");
        let date = header.date().unwrap();
        assert_eq!(date.year(), 2006);
        assert_eq!(date.hour(), 15);
        assert_eq!(date.offset().local_minus_utc(), -7 * 3600);

        header.set("Date", "02 Jan 06 15:04 +0000");
        let date = header.date().unwrap();
        assert_eq!(date.year(), 2006);
        assert_eq!(date.minute(), 4);
    }

    #[test]
    fn test_date_errors() {
        let mut header = Header::new();
        assert!(matches!(header.date(), Err(Error::MissingField(f)) if f == "Date"));
        header.set("Date", "yesterday");
        assert!(matches!(header.date(), Err(Error::InvalidDate(_))));
    }

    #[test]
    fn test_address_list() {
        let mut header = Header::new();
        header.set("To", "Alice <a@x.com>, b@x.com");
        let list = header.address_list("to").unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].name(), "Alice");

        assert!(matches!(header.address_list("Cc"), Err(Error::MissingField(_))));
        header.set("Cc", "nobody here");
        assert!(header.address_list("Cc").unwrap_err().is_parse());
    }

    #[test]
    fn test_content_type_accessors() {
        let mut header = Header::new();
        assert!(matches!(header.content_type(), Err(Error::MissingField(_))));
        assert!(matches!(header.content_disposition(), Err(Error::MissingField(_))));

        header.set("Content-Type", "text/plain; charset=\"utf-8\"");
        header.set("Content-Disposition", "attachment; filename=report.pdf");
        let (media_type, params) = header.content_type().unwrap();
        assert_eq!(media_type, "text/plain");
        assert_eq!(params.get("charset").map(String::as_str), Some("utf-8"));

        let (disposition, params) = header.content_disposition().unwrap();
        assert_eq!(disposition, "attachment");
        assert_eq!(params.get("filename").map(String::as_str), Some("report.pdf"));

        header.set("Content-Type", "text/plain; charset");
        assert!(matches!(header.content_type(), Err(Error::InvalidContentType(_))));
    }

    #[test]
    fn test_write_field_order() {
        let mut header = Header::new();
        for field in ["To", "Subject", "Message-Id", "MIME-Version", "From", "Date"] {
            header.set(field, "x");
        }
        let out = to_string(&header);
        let names: Vec<&str> = out.lines().map(|l| l.split(':').next().unwrap()).collect();
        assert_eq!(
            names,
            ["Date", "From", "MIME-Version", "Message-Id", "Subject", "To"]
        );
    }

    #[test]
    fn test_write_repeated_values_in_order() {
        let mut header = Header::new();
        header.add("Received", "by b");
        header.add("Received", "by a");
        assert_eq!(to_string(&header), "Received: by b\nReceived: by a\n");
    }

    #[test]
    fn test_write_skips_bcc() {
        let mut header = Header::new();
        header.add("Bcc", "secret@x.com");
        header.add("bcc", "other@x.com");
        header.set("Subject", "Hi");
        let out = to_string(&header);
        assert_eq!(out, "Subject: Hi\n");
        assert_eq!(header.bcc(), vec!["secret@x.com"]);
    }

    #[test]
    fn test_write_address_list() {
        let mut header = Header::new();
        header.set("To", "b@x.com,c@x.com");
        header.set("Cc", "\"Doe, Jane\" <jane@x.com>, Jöhn <john@x.com>");
        let out = to_string(&header);
        assert!(out.contains("To: b@x.com, c@x.com\n"));
        assert!(out.contains("Cc: \"Doe, Jane\" <jane@x.com>, =?UTF-8?B?SsO2aG4=?= <john@x.com>\n"));
    }

    #[test]
    fn test_write_message_id_keeps_brackets() {
        let mut header = Header::new();
        header.set("Message-Id", "<1.2.3@host>");
        header.set("In-Reply-To", "<4.5.6@host>");
        assert_eq!(
            to_string(&header),
            "In-Reply-To: <4.5.6@host>\nMessage-Id: <1.2.3@host>\n"
        );
    }

    #[test]
    fn test_write_encoded_subject() {
        let mut header = Header::new();
        header.set("Subject", "Héllo");
        assert_eq!(to_string(&header), "Subject: =?UTF-8?B?SMOpbGxv?=\n");
    }

    #[test]
    fn test_write_folds_long_values() {
        let mut header = Header::new();
        let recipients: Vec<String> = (0..12).map(|i| format!("user{i}@example.com")).collect();
        header.set_to(&recipients);
        let config = HeaderConfig::recommended();
        let mut out = Vec::new();
        header.write_to_with(&mut out, &config).unwrap();
        let out = String::from_utf8(out).unwrap();

        let lines: Vec<&str> = out.lines().collect();
        assert!(lines.len() > 1);
        assert!(lines[1..].iter().all(|l| l.starts_with(' ')));
        assert!(lines.iter().all(|l| l.len() <= 78));
        assert_eq!(header.address_list("To").unwrap().len(), 12);
        let unfolded = out.replace("\n ", " ");
        assert_eq!(unfolded, format!("To: {}\n", recipients.join(", ")));
    }

    #[test]
    fn test_write_long_token_stays_on_name_line() {
        let mut header = Header::new();
        let token = "y".repeat(1200);
        header.set("Subject", token.clone());
        assert_eq!(to_string(&header), format!("Subject: {token}\n"));
    }

    #[test]
    fn test_write_folds_after_name_prefix() {
        let mut header = Header::new();
        let word = "y".repeat(80);
        header.set("Subject", format!("{word} tail"));
        let mut out = Vec::new();
        header.write_to_with(&mut out, &HeaderConfig::recommended()).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("Subject: {word}\n tail\n")
        );
    }

    #[test]
    fn test_write_returns_byte_count() {
        let header = Header::for_message("a@x.com", "Hi", &["b@x.com"]);
        let mut out = Vec::new();
        let written = header.write_to(&mut out).unwrap();
        assert_eq!(written, out.len() as u64);
    }

    #[test]
    fn test_write_error_carries_partial_count() {
        let header = Header::for_message("a@x.com", "Hello", &["b@x.com"]);
        let sink = FailingSink {
            accepted: 0,
            limit: 20,
        };
        let err = header.write_to(sink).unwrap_err();
        assert!(matches!(err, Error::Write { .. }));
        let written = err.bytes_written().unwrap();
        assert!(written > 0 && written <= 20);
    }

    #[test]
    fn test_display() {
        let header = Header::for_message("a@x.com", "Hi", &["b@x.com"]);
        assert_eq!(header.to_string(), "From: a@x.com\nSubject: Hi\nTo: b@x.com\n");
    }

    proptest! {
        #[test]
        fn prop_set_get_any_case(
            key in "[A-Za-z][A-Za-z0-9]{0,10}(-[A-Za-z0-9]{1,10}){0,3}",
            value in "\\PC{0,40}",
            upper in any::<bool>(),
        ) {
            let mut header = Header::new();
            header.set(&key, value.clone());
            let lookup = if upper { key.to_uppercase() } else { key.to_lowercase() };
            prop_assert_eq!(header.get(&lookup), value.as_str());
        }

        #[test]
        fn prop_ascii_text_written_verbatim(value in "[A-Za-z0-9 .!?']{0,200}") {
            let mut header = Header::new();
            header.set("Subject", value.clone());
            prop_assert_eq!(to_string(&header), format!("Subject: {value}\n"));
        }

        #[test]
        fn prop_non_ascii_text_round_trips(value in "[^\\x00-\\x7f@]{1,40}") {
            let mut header = Header::new();
            header.set("Subject", value.clone());
            let out = to_string(&header);
            let encoded = out
                .strip_prefix("Subject: ")
                .and_then(|rest| rest.strip_suffix('\n'))
                .unwrap();
            prop_assert!(encoded.starts_with("=?UTF-8?B?"));
            prop_assert_eq!(decode_words(encoded).unwrap(), value);
        }

        #[test]
        fn prop_bcc_never_written(bcc in proptest::collection::vec("[a-z]{1,8}@x\\.com", 0..10)) {
            let mut header = Header::for_message("a@x.com", "Hi", &["b@x.com"]);
            for address in &bcc {
                header.add("Bcc", address.clone());
            }
            let out = to_string(&header);
            prop_assert!(out.lines().all(|l| !l.starts_with("Bcc:")));
            prop_assert_eq!(header.get_all("Bcc").len(), bcc.len());
        }
    }
}
