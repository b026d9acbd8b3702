//! # mailwire
//!
//! Byte-exact serialization of email message headers.
//!
//! ## Features
//!
//! - **Header store**: Case-insensitive fields with multiple values
//! - **Serialization**: Lexicographic field order, RFC 2047 encoded words, Bcc never written
//! - **Line folding**: RFC 5322 folding at a configurable width
//! - **Streams**: Base64 line wrapping and leading-whitespace trimming
//! - **Identifiers**: Unique Message-ID, Content-ID and boundary generation
//!
//! ## Quick Start
//!
//! ### Writing a Header
//!
//! ```
//! use mailwire::Header;
//!
//! let mut header = Header::for_message("a@x.com", "Hi", &["b@x.com", "c@x.com"]);
//! header.save()?;
//!
//! let mut out = Vec::new();
//! let written = header.write_to(&mut out)?;
//! assert_eq!(written, out.len() as u64);
//!
//! let text = String::from_utf8_lossy(&out);
//! assert!(text.contains("To: b@x.com, c@x.com\n"));
//! assert!(text.contains("MIME-Version: 1.0\n"));
//! # Ok::<(), mailwire::Error>(())
//! ```
//!
//! ### Folding for Transport
//!
//! ```
//! use mailwire::{Header, HeaderConfig, LineEnding};
//!
//! let config = HeaderConfig::builder()
//!     .line_ending(LineEnding::Crlf)
//!     .max_line_length(78)
//!     .build();
//!
//! let mut header = Header::new();
//! header.set("Subject", "Grüße aus Köln");
//!
//! let mut out = Vec::new();
//! header.write_to_with(&mut out, &config)?;
//! assert!(out.starts_with(b"Subject: =?UTF-8?B?"));
//! assert!(out.ends_with(b"\r\n"));
//! # Ok::<(), mailwire::Error>(())
//! ```
//!
//! ### Body Streams
//!
//! ```
//! use std::io::{Read, Write};
//! use mailwire::stream::{Base64LineWriter, WhitespaceTrimmingReader};
//!
//! let mut body = String::new();
//! WhitespaceTrimmingReader::from_reader(&b"\n\n  Hello"[..]).read_to_string(&mut body)?;
//! assert_eq!(body, "Hello");
//!
//! let mut writer = Base64LineWriter::new(Vec::new(), 4);
//! writer.write_all(b"SGVsbG8=")?;
//! assert_eq!(writer.into_inner(), b"SGVs\nbG8=");
//! # Ok::<(), std::io::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod header;

pub mod address;
pub mod content_type;
pub mod encoding;
pub mod id;
pub mod stream;

pub use address::{Address, parse_address_list};
pub use config::{
    HeaderConfig, HeaderConfigBuilder, LineEnding, MAX_HEADER_LINE_LENGTH, MAX_HEADER_TOTAL_LENGTH,
};
pub use content_type::{Parameters, parse_media_type};
pub use error::{Error, Result};
pub use header::{Header, canonical_key};
pub use id::IdGenerator;
pub use stream::{Base64LineWriter, LineFoldingWriter, WhitespaceTrimmingReader};
