//! Header line folding (RFC 5322 section 2.2.3).

use crate::config::{HeaderConfig, LineEnding};
use std::io::{self, Write};

/// Writer that folds header lines before they exceed a maximum width.
///
/// Lines are broken before a space, so every continuation line starts with
/// whitespace. One column is reserved for that space on each continuation
/// line. Where no space is available within the width, the break moves to
/// the next space after it, and a chunk with no space left is written
/// whole: tokens, encoded words and UTF-8 sequences are never split.
///
/// The line-length state belongs to a single serialization pass; call
/// [`reset_line`](Self::reset_line) at the start of every field.
#[derive(Debug)]
pub struct LineFoldingWriter<W> {
    inner: W,
    line_len: usize,
    max_line_len: usize,
    line_ending: LineEnding,
    written: u64,
}

impl<W: Write> LineFoldingWriter<W> {
    /// Creates a folding writer with `\n` terminators.
    #[must_use]
    pub fn new(inner: W, max_line_len: usize) -> Self {
        Self {
            inner,
            line_len: 0,
            max_line_len: max_line_len.max(2),
            line_ending: LineEnding::Lf,
            written: 0,
        }
    }

    /// Creates a folding writer from a serialization config.
    #[must_use]
    pub fn with_config(inner: W, config: &HeaderConfig) -> Self {
        Self {
            line_ending: config.line_ending,
            ..Self::new(inner, config.max_line_length)
        }
    }

    /// Starts a fresh line budget, as at the beginning of a field.
    pub const fn reset_line(&mut self) {
        self.line_len = 0;
    }

    /// Returns the length of the current output line.
    #[must_use]
    pub const fn line_len(&self) -> usize {
        self.line_len
    }

    /// Returns the total bytes passed to the inner writer, fold breaks included.
    #[must_use]
    pub const fn bytes_written(&self) -> u64 {
        self.written
    }

    /// Returns a reference to the inner writer.
    #[must_use]
    pub const fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Consumes the folding writer, returning the inner writer.
    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Writes `bytes` on the current line without looking for fold points.
    ///
    /// Used for text that must stay together, such as a `Name: ` field
    /// prefix. The bytes still count toward the line length.
    ///
    /// # Errors
    ///
    /// Returns any error from the inner writer.
    pub fn write_unbroken(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.emit(bytes)?;
        self.line_len += bytes.len();
        Ok(())
    }

    fn emit(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.inner.write_all(bytes)?;
        self.written += bytes.len() as u64;
        Ok(())
    }

    /// Finds where to break `chunk` given `limit` bytes left on the line.
    ///
    /// A break at 0 (before the chunk) is only allowed once the current
    /// line holds more than the continuation column.
    fn fold_point(&self, chunk: &[u8], limit: usize) -> Option<usize> {
        let limit = limit.min(chunk.len());
        let before = chunk[..limit]
            .iter()
            .rposition(|&b| b == b' ')
            .filter(|&i| i > 0);
        if before.is_some() {
            return before;
        }
        if self.line_len > 1 && chunk.first() == Some(&b' ') {
            return Some(0);
        }
        let from = limit.max(1);
        chunk
            .get(from..)?
            .iter()
            .position(|&b| b == b' ')
            .map(|i| i + from)
    }
}

impl<W: Write> Write for LineFoldingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let mut chunk = buf;
        while self.line_len + chunk.len() > self.max_line_len {
            let limit = self.max_line_len.saturating_sub(self.line_len);
            let Some(cut) = self.fold_point(chunk, limit) else {
                break;
            };
            tracing::trace!(line_len = self.line_len, cut, "folding header line");
            self.emit(&chunk[..cut])?;
            self.emit(self.line_ending.as_bytes())?;
            chunk = &chunk[cut..];
            // the continuation starts with the space we broke before
            self.line_len = 1;
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
    use proptest::prelude::*;

    fn fold(input: &[&str], width: usize) -> String {
        let mut writer = LineFoldingWriter::new(Vec::new(), width);
        for chunk in input {
            writer.write_all(chunk.as_bytes()).unwrap();
        }
        String::from_utf8(writer.into_inner()).unwrap()
    }

    #[test]
    fn test_short_input_untouched() {
        assert_eq!(fold(&["Subject: ", "Hello"], 78), "Subject: Hello");
    }

    #[test]
    fn test_folds_at_last_space() {
        assert_eq!(fold(&["aaa bbb ccc"], 8), "aaa bbb\n ccc");
    }

    #[test]
    fn test_continuation_reserves_column() {
        let out = fold(&["aaaa bbbb cccc dddd"], 10);
        assert_eq!(out, "aaaa bbbb\n cccc\n dddd");
        for line in out.lines() {
            assert!(line.len() <= 10);
        }
    }

    #[test]
    fn test_folds_across_chunks() {
        let mut writer = LineFoldingWriter::new(Vec::new(), 12);
        writer.write_all(b"To: ").unwrap();
        writer.write_all(b"a@x.co,").unwrap();
        assert_eq!(writer.line_len(), 11);
        writer.write_all(b" b@x.co").unwrap();
        let out = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(out, "To: a@x.co,\n b@x.co");
    }

    #[test]
    fn test_full_line_overflows_only_by_chunk_prefix() {
        let mut writer = LineFoldingWriter::new(Vec::new(), 10);
        writer.write_all(b"To: a@x.co").unwrap();
        writer.write_all(b", b@x.co").unwrap();
        let out = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(out, "To: a@x.co,\n b@x.co");
    }

    #[test]
    fn test_long_token_not_split() {
        let token = "x".repeat(20);
        assert_eq!(fold(&[&token], 8), token);
    }

    #[test]
    fn test_breaks_after_long_token() {
        let out = fold(&["xxxxxxxxxxxx yy"], 8);
        assert_eq!(out, "xxxxxxxxxxxx\n yy");
    }

    #[test]
    fn test_empty_write_after_overlong_token() {
        let mut writer = LineFoldingWriter::new(Vec::new(), 8);
        writer.write_all(b"xxxxxxxxxxxxxxxx").unwrap();
        assert_eq!(writer.line_len(), 16);
        assert_eq!(writer.write(b"").unwrap(), 0);
        writer.write_all(b"yy").unwrap();
        assert_eq!(writer.into_inner(), b"xxxxxxxxxxxxxxxxyy");
    }

    #[test]
    fn test_write_unbroken_keeps_prefix() {
        let mut writer = LineFoldingWriter::new(Vec::new(), 6);
        writer.write_unbroken(b"Subject: ").unwrap();
        assert_eq!(writer.line_len(), 9);
        writer.write_all(b"ab cd").unwrap();
        assert_eq!(writer.bytes_written(), 15);
        assert_eq!(writer.into_inner(), b"Subject: ab\n cd");
    }

    #[test]
    fn test_multibyte_not_split() {
        let out = fold(&["ééééééééé"], 4);
        assert_eq!(out, "ééééééééé");
    }

    #[test]
    fn test_reset_line() {
        let mut writer = LineFoldingWriter::new(Vec::new(), 6);
        writer.write_all(b"abc").unwrap();
        writer.write_all(b"\n").unwrap();
        writer.reset_line();
        writer.write_all(b"def gh").unwrap();
        assert_eq!(writer.into_inner(), b"abc\ndef gh");
    }

    #[test]
    fn test_crlf_fold() {
        let config = HeaderConfig::builder()
            .line_ending(LineEnding::Crlf)
            .max_line_length(8)
            .build();
        let mut writer = LineFoldingWriter::with_config(Vec::new(), &config);
        writer.write_all(b"aaa bbb ccc").unwrap();
        assert_eq!(writer.bytes_written(), 13);
        assert_eq!(writer.into_inner(), b"aaa bbb\r\n ccc");
    }

    #[test]
    fn test_bytes_written_counts_breaks() {
        let mut writer = LineFoldingWriter::new(Vec::new(), 8);
        let n = writer.write(b"aaa bbb ccc").unwrap();
        assert_eq!(n, 11);
        assert_eq!(writer.bytes_written(), 12);
    }

    proptest! {
        #[test]
        fn prop_lines_within_width(
            words in proptest::collection::vec("[a-z]{1,10}", 1..60),
            width in 20_usize..120,
        ) {
            let text = words.join(" ");
            let out = fold(&[&text], width);
            for line in out.split('\n') {
                prop_assert!(line.len() <= width, "line {:?} exceeds {}", line, width);
            }
            prop_assert_eq!(out.replace("\n", ""), text);
        }
    }
}
