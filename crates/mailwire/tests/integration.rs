//! Integration tests for header serialization.
//!
//! These drive the public API the way a message builder would: build a
//! header, save it, and write it to a sink.

#![allow(clippy::unwrap_used)]

use std::collections::HashSet;
use std::io::{Read, Write};

use mailwire::id::{FixedIdentity, IdGenerator};
use mailwire::stream::{BASE64_LINE_LENGTH, Base64LineWriter, WhitespaceTrimmingReader};
use mailwire::{Header, HeaderConfig, LineEnding, encoding};
use rand::rngs::OsRng;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("mailwire=trace")
        .with_test_writer()
        .try_init();
}

fn generator() -> IdGenerator<FixedIdentity, OsRng> {
    IdGenerator::new(FixedIdentity::new("mail.example.com", 4242), OsRng)
}

fn write(header: &Header) -> String {
    let mut out = Vec::new();
    let written = header.write_to(&mut out).unwrap();
    assert_eq!(written, out.len() as u64);
    String::from_utf8(out).unwrap()
}

#[test]
fn test_saved_message_header() {
    init_tracing();

    let mut header = Header::for_message("a@x.com", "Hi", &["b@x.com", "c@x.com"]);
    header.save_with(&generator()).unwrap();
    let out = write(&header);

    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 6);
    assert!(lines[0].starts_with("Date: "));
    assert_eq!(lines[1], "From: a@x.com");
    assert_eq!(lines[2], "MIME-Version: 1.0");
    assert!(lines[3].starts_with("Message-Id: <"));
    assert!(lines[3].ends_with("@mail.example.com>"));
    assert_eq!(lines[4], "Subject: Hi");
    assert_eq!(lines[5], "To: b@x.com, c@x.com");
    assert!(out.ends_with('\n'));
    assert!(!out.contains('\r'));

    assert!(header.date().is_ok());
}

#[test]
fn test_bcc_kept_but_not_written() {
    init_tracing();

    let mut header = Header::for_message("a@x.com", "Hi", &["b@x.com"]);
    header.set_bcc(&["hidden@x.com", "secret@x.com"]);
    header.save().unwrap();

    let out = write(&header);
    assert!(!out.contains("Bcc"));
    assert!(!out.contains("hidden@x.com"));
    assert_eq!(header.bcc(), vec!["hidden@x.com", "secret@x.com"]);
}

#[test]
fn test_save_twice_keeps_identity() {
    let mut header = Header::new();
    header.save_with(&generator()).unwrap();
    let first = write(&header);

    header.save_with(&generator()).unwrap();
    assert_eq!(write(&header), first);
}

#[test]
fn test_crlf_and_recommended_width() {
    init_tracing();

    let config = HeaderConfig::builder()
        .line_ending(LineEnding::Crlf)
        .max_line_length(mailwire::MAX_HEADER_LINE_LENGTH)
        .build();

    let recipients: Vec<String> = (0..20)
        .map(|i| format!("Recipient {i} <r{i}@example.org>"))
        .collect();
    let mut header = Header::new();
    header.set_to(&recipients);
    header.set_subject("Quarterly numbers für das Team, bitte bis Freitag prüfen und freigeben");

    let mut out = Vec::new();
    header.write_to_with(&mut out, &config).unwrap();
    let out = String::from_utf8(out).unwrap();

    assert!(out.ends_with("\r\n"));
    assert!(!out.replace("\r\n", "").contains('\n'));
    for line in out.split("\r\n").filter(|l| !l.is_empty()) {
        assert!(line.len() <= 78, "line too long: {line:?}");
    }

    let unfolded = out.replace("\r\n ", " ");
    let mut lines = unfolded.lines();
    let subject = lines.next().unwrap().strip_prefix("Subject: ").unwrap();
    assert_eq!(encoding::decode_words(subject).unwrap(), header.subject());
    let to = lines.next().unwrap().strip_prefix("To: ").unwrap();
    let parsed = mailwire::parse_address_list(to).unwrap();
    assert_eq!(parsed.len(), 20);
    assert_eq!(parsed[7].name(), "Recipient 7");
    assert_eq!(parsed[7].address, "r7@example.org");
}

#[test]
fn test_identifiers_are_unique() {
    let generator = generator();
    let mut seen = HashSet::new();
    for i in 0..1000 {
        let id = if i % 2 == 0 {
            generator.message_id().unwrap()
        } else {
            generator.content_id("part.txt").unwrap()
        };
        assert!(seen.insert(id));
    }

    let boundaries: HashSet<String> = (0..100)
        .map(|_| mailwire::id::random_boundary().unwrap())
        .collect();
    assert_eq!(boundaries.len(), 100);
}

#[test]
fn test_body_streams() {
    let body = encoding::encode_base64(&[0xA5; 300]);
    let mut writer = Base64LineWriter::new(Vec::new(), BASE64_LINE_LENGTH);
    writer.write_all(body.as_bytes()).unwrap();
    let wrapped = String::from_utf8(writer.into_inner()).unwrap();
    assert!(wrapped.lines().all(|l| l.len() <= BASE64_LINE_LENGTH));
    assert_eq!(wrapped.replace('\n', ""), body);

    let source = format!("\r\n\r\n  {wrapped}");
    let mut reader = WhitespaceTrimmingReader::from_reader(source.as_bytes());
    let mut trimmed = String::new();
    reader.read_to_string(&mut trimmed).unwrap();
    assert_eq!(trimmed, wrapped);

    let decoded = encoding::decode_base64(&trimmed.replace('\n', "")).unwrap();
    assert_eq!(decoded, vec![0xA5; 300]);
}
