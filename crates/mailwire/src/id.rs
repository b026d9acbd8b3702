//! Globally unique identifiers for Message-ID, Content-ID and MIME boundaries.
//!
//! Identifiers have the form `<nanos>.<pid>.<random>[.<discriminator>]@<hostname>`,
//! where `random` is a 63-bit value from a cryptographic source.
//!
//! # Example
//!
//! ```
//! use mailwire::id::{FixedIdentity, IdGenerator};
//! use rand::rngs::OsRng;
//!
//! let generator = IdGenerator::new(FixedIdentity::new("mail.example.com", 42), OsRng);
//! let id = generator.message_id()?;
//! assert!(id.ends_with("@mail.example.com"));
//! # Ok::<(), mailwire::Error>(())
//! ```

use crate::error::Result;
use rand::RngCore;
use rand::rngs::OsRng;

/// Fallback when the hostname cannot be determined.
const DEFAULT_HOSTNAME: &str = "localhost";

/// Random bytes behind a multipart boundary (60 hex characters).
const BOUNDARY_BYTES: usize = 30;

/// Process identity used to make identifiers globally unique.
///
/// In production, use [`SystemIdentity`]. In tests, use [`FixedIdentity`]
/// for deterministic host and process values.
pub trait Identity: Send + Sync {
    /// Returns the local hostname.
    fn hostname(&self) -> String;

    /// Returns the current process id.
    fn pid(&self) -> u32;
}

/// Identity of the running process and host.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemIdentity;

impl Identity for SystemIdentity {
    fn hostname(&self) -> String {
        gethostname::gethostname()
            .into_string()
            .ok()
            .filter(|host| !host.is_empty())
            .unwrap_or_else(|| {
                tracing::debug!("hostname unavailable, using {DEFAULT_HOSTNAME}");
                DEFAULT_HOSTNAME.to_string()
            })
    }

    fn pid(&self) -> u32 {
        std::process::id()
    }
}

/// A fixed identity, for tests and reproducible output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedIdentity {
    hostname: String,
    pid: u32,
}

impl FixedIdentity {
    /// Creates a fixed identity.
    #[must_use]
    pub fn new(hostname: impl Into<String>, pid: u32) -> Self {
        Self {
            hostname: hostname.into(),
            pid,
        }
    }
}

impl Identity for FixedIdentity {
    fn hostname(&self) -> String {
        self.hostname.clone()
    }

    fn pid(&self) -> u32 {
        self.pid
    }
}

/// Cryptographic entropy source. Must be safe to use from several threads.
pub trait Entropy: Send + Sync {
    /// Fills `dest` with random bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot provide entropy.
    fn try_fill(&self, dest: &mut [u8]) -> std::result::Result<(), rand::Error>;
}

impl Entropy for OsRng {
    fn try_fill(&self, dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
        let mut rng = *self;
        rng.try_fill_bytes(dest)
    }
}

/// Generator for unique identifiers and boundary tokens.
///
/// Each call is independent; the generator holds no mutable state.
#[derive(Debug, Clone)]
pub struct IdGenerator<I = SystemIdentity, E = OsRng> {
    identity: I,
    entropy: E,
}

impl IdGenerator {
    /// Creates a generator using the system identity and the OS entropy source.
    #[must_use]
    pub const fn system() -> Self {
        Self {
            identity: SystemIdentity,
            entropy: OsRng,
        }
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::system()
    }
}

impl<I: Identity, E: Entropy> IdGenerator<I, E> {
    /// Creates a generator from an identity and an entropy source.
    #[must_use]
    pub const fn new(identity: I, entropy: E) -> Self {
        Self { identity, entropy }
    }

    /// Generates an identifier, optionally tagged with `discriminator`
    /// (e.g. an attachment filename).
    ///
    /// # Errors
    ///
    /// Returns [`Error::IdGeneration`](crate::Error::IdGeneration) if the
    /// entropy source fails.
    pub fn generate(&self, discriminator: &str) -> Result<String> {
        let mut bytes = [0_u8; 8];
        self.entropy.try_fill(&mut bytes).inspect_err(|e| {
            tracing::warn!(error = %e, "entropy source failed");
        })?;
        let random = u64::from_be_bytes(bytes) >> 1;

        let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let pid = self.identity.pid();
        let hostname = self.identity.hostname();

        if discriminator.is_empty() {
            Ok(format!("{nanos}.{pid}.{random}@{hostname}"))
        } else {
            Ok(format!("{nanos}.{pid}.{random}.{discriminator}@{hostname}"))
        }
    }

    /// Generates a Message-ID, without surrounding angle brackets.
    ///
    /// # Errors
    ///
    /// Returns an error if the entropy source fails.
    pub fn message_id(&self) -> Result<String> {
        self.generate("")
    }

    /// Generates a Content-ID for `filename`, without surrounding angle brackets.
    ///
    /// # Errors
    ///
    /// Returns an error if the entropy source fails.
    pub fn content_id(&self, filename: &str) -> Result<String> {
        self.generate(filename)
    }

    /// Generates a multipart boundary: 30 random bytes as 60 hex characters.
    ///
    /// # Errors
    ///
    /// Returns an error if the entropy source fails.
    pub fn random_boundary(&self) -> Result<String> {
        let mut bytes = [0_u8; BOUNDARY_BYTES];
        self.entropy.try_fill(&mut bytes).inspect_err(|e| {
            tracing::warn!(error = %e, "entropy source failed");
        })?;
        Ok(hex::encode(bytes))
    }
}

/// Generates a Message-ID with the system generator.
///
/// # Errors
///
/// Returns an error if the entropy source fails.
pub fn message_id() -> Result<String> {
    IdGenerator::system().message_id()
}

/// Generates a Content-ID for `filename` with the system generator.
///
/// # Errors
///
/// Returns an error if the entropy source fails.
pub fn content_id(filename: &str) -> Result<String> {
    IdGenerator::system().content_id(filename)
}

/// Generates a multipart boundary with the OS entropy source.
///
/// # Errors
///
/// Returns an error if the entropy source fails.
pub fn random_boundary() -> Result<String> {
    IdGenerator::system().random_boundary()
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
    use crate::Error;
    use std::collections::HashSet;

    /// Entropy source that always fails.
    struct BrokenEntropy;

    impl Entropy for BrokenEntropy {
        fn try_fill(&self, _dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
            Err(rand::Error::new(std::io::Error::other("no entropy")))
        }
    }

    /// Entropy source returning all-ones bytes.
    struct SaturatedEntropy;

    impl Entropy for SaturatedEntropy {
        fn try_fill(&self, dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
            dest.fill(0xFF);
            Ok(())
        }
    }

    fn fixed() -> IdGenerator<FixedIdentity, OsRng> {
        IdGenerator::new(FixedIdentity::new("mail.example.com", 4242), OsRng)
    }

    #[test]
    fn test_message_id_format() {
        let id = fixed().message_id().unwrap();
        let (local, host) = id.split_once('@').unwrap();
        assert_eq!(host, "mail.example.com");

        let parts: Vec<&str> = local.split('.').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts[0].parse::<i64>().unwrap() > 0);
        assert_eq!(parts[1], "4242");
        assert!(parts[2].parse::<u64>().unwrap() <= u64::MAX >> 1);
    }

    #[test]
    fn test_content_id_discriminator() {
        let id = fixed().content_id("logo.png").unwrap();
        assert!(id.ends_with(".logo.png@mail.example.com"));
        let (local, _) = id.split_once('@').unwrap();
        assert_eq!(local.split('.').count(), 5);
    }

    #[test]
    fn test_random_is_63_bits() {
        let generator = IdGenerator::new(FixedIdentity::new("h", 1), SaturatedEntropy);
        let id = generator.message_id().unwrap();
        assert!(id.contains(&format!(".1.{}@h", u64::MAX >> 1)));
    }

    #[test]
    fn test_uniqueness() {
        let generator = fixed();
        let mut seen = HashSet::new();
        for _ in 0..1000 {
            let id = generator.message_id().unwrap();
            assert!(seen.insert(id), "duplicate identifier generated");
        }
    }

    #[test]
    fn test_boundary_format() {
        let boundary = random_boundary().unwrap();
        assert_eq!(boundary.len(), 60);
        assert!(boundary.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(boundary, random_boundary().unwrap());
    }

    #[test]
    fn test_entropy_failure_propagates() {
        let generator = IdGenerator::new(FixedIdentity::new("h", 1), BrokenEntropy);
        assert!(matches!(generator.message_id(), Err(Error::IdGeneration(_))));
        assert!(matches!(generator.content_id("a.txt"), Err(Error::IdGeneration(_))));
        assert!(matches!(generator.random_boundary(), Err(Error::IdGeneration(_))));
    }

    #[test]
    fn test_system_identity() {
        let identity = SystemIdentity;
        assert!(!identity.hostname().is_empty());
        assert_eq!(identity.pid(), std::process::id());
        assert!(message_id().unwrap().contains('@'));
    }
}
