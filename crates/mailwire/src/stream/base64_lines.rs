//! Fixed-width line wrapping for base64 body output.

use std::io::{self, Write};

/// Line width for base64 bodies (RFC 2045 section 6.8).
pub const BASE64_LINE_LENGTH: usize = 76;

/// Writer that breaks already-encoded base64 output into fixed-width lines.
///
/// Unlike header folding there is no continuation column: every line holds
/// exactly `max_line_len` bytes except the last.
#[derive(Debug)]
pub struct Base64LineWriter<W> {
    inner: W,
    line_len: usize,
    max_line_len: usize,
    written: u64,
}

impl<W: Write> Base64LineWriter<W> {
    /// Creates a writer wrapping at `max_line_len` bytes (at least 1).
    #[must_use]
    pub fn new(inner: W, max_line_len: usize) -> Self {
        Self {
            inner,
            line_len: 0,
            max_line_len: max_line_len.max(1),
            written: 0,
        }
    }

    /// Returns the length of the current output line.
    #[must_use]
    pub const fn line_len(&self) -> usize {
        self.line_len
    }

    /// Returns the total bytes passed to the inner writer, line breaks included.
    #[must_use]
    pub const fn bytes_written(&self) -> u64 {
        self.written
    }

    /// Returns a mutable reference to the inner writer.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Consumes the line writer, returning the inner writer.
    pub fn into_inner(self) -> W {
        self.inner
    }

    fn emit(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.inner.write_all(bytes)?;
        self.written += bytes.len() as u64;
        Ok(())
    }
}

impl<W: Write> Write for Base64LineWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut chunk = buf;
        while self.line_len + chunk.len() > self.max_line_len {
            let (line, rest) = chunk.split_at(self.max_line_len - self.line_len);
            self.emit(line)?;
            self.emit(b"\n")?;
            chunk = rest;
            self.line_len = 0;
        }
        self.emit(chunk)?;
        self.line_len += chunk.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
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
    use crate::encoding::encode_base64;

    #[test]
    fn test_wraps_at_width() {
        let mut writer = Base64LineWriter::new(Vec::new(), 4);
        writer.write_all(b"abcdefghij").unwrap();
        assert_eq!(writer.into_inner(), b"abcd\nefgh\nij");
    }

    #[test]
    fn test_wraps_across_writes() {
        let mut writer = Base64LineWriter::new(Vec::new(), 4);
        writer.write_all(b"abc").unwrap();
        writer.write_all(b"def").unwrap();
        assert_eq!(writer.line_len(), 2);
        assert_eq!(writer.into_inner(), b"abcd\nef");
    }

    #[test]
    fn test_exact_width_no_trailing_break() {
        let mut writer = Base64LineWriter::new(Vec::new(), 4);
        writer.write_all(b"abcd").unwrap();
        assert_eq!(writer.bytes_written(), 4);
        writer.write_all(b"e").unwrap();
        assert_eq!(writer.into_inner(), b"abcd\ne");
    }

    #[test]
    fn test_encoded_body_lines() {
        let encoded = encode_base64(&[0xA5_u8; 200]);
        let mut writer = Base64LineWriter::new(Vec::new(), BASE64_LINE_LENGTH);
        writer.write_all(encoded.as_bytes()).unwrap();
        let out = String::from_utf8(writer.into_inner()).unwrap();
        let lines: Vec<&str> = out.split('\n').collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[..3].iter().all(|l| l.len() == BASE64_LINE_LENGTH));
        assert_eq!(lines.concat(), encoded);
    }
}
