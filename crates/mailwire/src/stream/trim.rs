//! Leading-whitespace trimming for body sources.

use std::io::{self, BufRead, BufReader, Read};

/// Reader that drops ASCII whitespace from the very start of a stream.
///
/// Only the leading run is removed. Once a non-whitespace byte (or end of
/// stream) has been seen, all reads go straight to the inner reader, so
/// whitespace later in the stream is preserved.
#[derive(Debug)]
pub struct WhitespaceTrimmingReader<R> {
    inner: R,
    done: bool,
}

impl<R: BufRead> WhitespaceTrimmingReader<R> {
    /// Wraps a buffered reader.
    #[must_use]
    pub const fn new(inner: R) -> Self {
        Self { inner, done: false }
    }

    /// Returns true once the leading whitespace has been consumed.
    #[must_use]
    pub const fn is_done(&self) -> bool {
        self.done
    }

    /// Consumes the trimming reader, returning the inner reader.
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Discards leading whitespace one buffered window at a time.
    fn trim(&mut self) -> io::Result<()> {
        while !self.done {
            let window = self.inner.fill_buf()?;
            if window.is_empty() {
                self.done = true;
                break;
            }
            let whitespace = window.iter().take_while(|b| is_ascii_space(**b)).count();
            // more whitespace may follow in the next fill
            let whole_window = whitespace == window.len();
            self.inner.consume(whitespace);
            if !whole_window {
                self.done = true;
            }
        }
        Ok(())
    }
}

impl<R: Read> WhitespaceTrimmingReader<BufReader<R>> {
    /// Wraps an unbuffered reader in a [`BufReader`] first.
    #[must_use]
    pub fn from_reader(inner: R) -> Self {
        Self::new(BufReader::new(inner))
    }
}

impl<R: BufRead> Read for WhitespaceTrimmingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.trim()?;
        self.inner.read(buf)
    }
}

impl<R: BufRead> BufRead for WhitespaceTrimmingReader<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.trim()?;
        self.inner.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.inner.consume(amt);
    }
}

const fn is_ascii_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
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
    use std::io::Cursor;

    fn read_all<R: Read>(mut reader: R) -> Vec<u8> {
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn test_trims_leading_whitespace() {
        let reader = WhitespaceTrimmingReader::new(Cursor::new(" \t\r\n SGVsbG8="));
        assert_eq!(read_all(reader), b"SGVsbG8=");
    }

    #[test]
    fn test_keeps_inner_whitespace() {
        let reader = WhitespaceTrimmingReader::new(Cursor::new("\n\nab\ncd \n"));
        assert_eq!(read_all(reader), b"ab\ncd \n");
    }

    #[test]
    fn test_empty_source() {
        let mut reader = WhitespaceTrimmingReader::new(Cursor::new(""));
        assert!(read_all(&mut reader).is_empty());
        assert!(reader.is_done());
    }

    #[test]
    fn test_all_whitespace() {
        let reader = WhitespaceTrimmingReader::new(Cursor::new(" \n\t "));
        assert!(read_all(reader).is_empty());
    }

    #[test]
    fn test_whitespace_spanning_fills() {
        // a 2-byte buffer forces several fills before the content appears
        let inner = BufReader::with_capacity(2, Cursor::new("      \n\nxy z"));
        let reader = WhitespaceTrimmingReader::new(inner);
        assert_eq!(read_all(reader), b"xy z");
    }

    #[test]
    fn test_from_reader() {
        let reader = WhitespaceTrimmingReader::from_reader(&b"  body"[..]);
        assert_eq!(read_all(reader), b"body");
    }

    #[test]
    fn test_buf_read_lines() {
        let reader = WhitespaceTrimmingReader::new(Cursor::new("\n\nfirst\n\nsecond\n"));
        let lines: Vec<String> = reader.lines().map(Result::unwrap).collect();
        assert_eq!(lines, vec!["first", "", "second"]);
    }

    proptest! {
        #[test]
        fn prop_only_leading_run_removed(
            leading in "[ \t\r\n]{0,40}",
            content in "[^ \t\r\n][ -~\t\r\n]{0,80}",
            capacity in 1_usize..16,
        ) {
            let input = format!("{leading}{content}");
            let inner = BufReader::with_capacity(capacity, Cursor::new(input.into_bytes()));
            let reader = WhitespaceTrimmingReader::new(inner);
            prop_assert_eq!(read_all(reader), content.into_bytes());
        }
    }
}
