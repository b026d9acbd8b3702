//! Streaming decorators used when writing headers and bodies.
//!
//! - [`LineFoldingWriter`]: folds header lines at word boundaries
//! - [`Base64LineWriter`]: wraps base64 output at a fixed width
//! - [`WhitespaceTrimmingReader`]: drops leading whitespace from a source

mod base64_lines;
mod fold;
mod trim;

pub use base64_lines::{BASE64_LINE_LENGTH, Base64LineWriter};
pub use fold::LineFoldingWriter;
pub use trim::WhitespaceTrimmingReader;
