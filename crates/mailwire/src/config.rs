//! Serialization configuration types.

use std::fmt;

/// Recommended maximum length of a header line, excluding the terminator.
pub const MAX_HEADER_LINE_LENGTH: usize = 78;

/// Hard maximum length of a header line, excluding the terminator.
pub const MAX_HEADER_TOTAL_LENGTH: usize = 998;

/// Smallest fold width the folding writer can make progress with.
const MIN_LINE_LENGTH: usize = 2;

/// Line terminator written after each field and at each fold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LineEnding {
    /// Bare line feed (`\n`).
    #[default]
    Lf,
    /// Carriage return + line feed (`\r\n`), as SMTP requires on the wire.
    Crlf,
}

impl LineEnding {
    /// Returns the terminator bytes.
    #[must_use]
    pub const fn as_bytes(self) -> &'static [u8] {
        match self {
            Self::Lf => b"\n",
            Self::Crlf => b"\r\n",
        }
    }

    /// Returns the terminator as a string slice.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::Crlf => "\r\n",
        }
    }
}

impl fmt::Display for LineEnding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lf => write!(f, "LF"),
            Self::Crlf => write!(f, "CRLF"),
        }
    }
}

/// Header serialization configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderConfig {
    /// Line terminator.
    pub line_ending: LineEnding,
    /// Fold width in bytes.
    pub max_line_length: usize,
}

impl HeaderConfig {
    /// Creates the default configuration: `\n` terminators, 998-byte lines.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            line_ending: LineEnding::Lf,
            max_line_length: MAX_HEADER_TOTAL_LENGTH,
        }
    }

    /// Creates a configuration folding at the recommended 78 columns.
    #[must_use]
    pub const fn recommended() -> Self {
        Self {
            line_ending: LineEnding::Lf,
            max_line_length: MAX_HEADER_LINE_LENGTH,
        }
    }

    /// Creates a configuration builder.
    #[must_use]
    pub const fn builder() -> HeaderConfigBuilder {
        HeaderConfigBuilder::new()
    }
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for header serialization configuration.
#[derive(Debug, Clone, Copy)]
pub struct HeaderConfigBuilder {
    line_ending: LineEnding,
    max_line_length: usize,
}

impl HeaderConfigBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            line_ending: LineEnding::Lf,
            max_line_length: MAX_HEADER_TOTAL_LENGTH,
        }
    }

    /// Sets the line terminator.
    #[must_use]
    pub const fn line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    /// Sets the fold width.
    #[must_use]
    pub const fn max_line_length(mut self, max_line_length: usize) -> Self {
        self.max_line_length = max_line_length;
        self
    }

    /// Builds the configuration.
    ///
    /// Widths below 2 are raised to 2.
    #[must_use]
    pub fn build(self) -> HeaderConfig {
        HeaderConfig {
            line_ending: self.line_ending,
            max_line_length: self.max_line_length.max(MIN_LINE_LENGTH),
        }
    }
}

impl Default for HeaderConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HeaderConfig::default();
        assert_eq!(config.line_ending, LineEnding::Lf);
        assert_eq!(config.max_line_length, MAX_HEADER_TOTAL_LENGTH);
    }

    #[test]
    fn test_recommended_config() {
        let config = HeaderConfig::recommended();
        assert_eq!(config.max_line_length, 78);
    }

    #[test]
    fn test_builder() {
        let config = HeaderConfig::builder()
            .line_ending(LineEnding::Crlf)
            .max_line_length(100)
            .build();
        assert_eq!(config.line_ending, LineEnding::Crlf);
        assert_eq!(config.max_line_length, 100);
    }

    #[test]
    fn test_builder_clamps_width() {
        let config = HeaderConfig::builder().max_line_length(0).build();
        assert_eq!(config.max_line_length, 2);
    }

    #[test]
    fn test_line_ending_bytes() {
        assert_eq!(LineEnding::Lf.as_bytes(), b"\n");
        assert_eq!(LineEnding::Crlf.as_bytes(), b"\r\n");
        assert_eq!(LineEnding::Crlf.as_str(), "\r\n");
        assert_eq!(LineEnding::Lf.to_string(), "LF");
    }
}
