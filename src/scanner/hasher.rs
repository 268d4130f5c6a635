//! Streaming content digests.
//!
//! # Overview
//!
//! This module provides the [`Hasher`] struct for computing content digests
//! of files using memory-efficient streaming, and the [`Digester`] trait that
//! the duplicate finder calls. Supported algorithms form a closed set, one per
//! digest width:
//!
//! | Algorithm | Bits |
//! |-----------|------|
//! | MD5       | 128  |
//! | SHA-1     | 160  |
//! | BLAKE3    | 256  |
//! | SHA-512   | 512  |
//!
//! A [`Digest`] carries the algorithm that produced it, so digests computed
//! under different algorithms never compare equal.
//!
//! # Example
//!
//! ```no_run
//! use dupefind::scanner::{Digester, DigestAlgorithm, Hasher};
//! use std::path::Path;
//!
//! let hasher = Hasher::new(DigestAlgorithm::Sha1);
//! let digest = hasher.digest(Path::new("file.txt"), 1024).unwrap();
//! println!("{}", digest);
//! ```

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::Digest as _;

/// Default read buffer size for streaming (64 KiB).
pub const BUFFER_SIZE: usize = 64 * 1024;

/// Supported content digest algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    /// MD5, 128-bit
    Md5,
    /// SHA-1, 160-bit
    Sha1,
    /// BLAKE3, 256-bit
    #[default]
    Blake3,
    /// SHA-512, 512-bit
    Sha512,
}

impl DigestAlgorithm {
    /// All supported algorithms, smallest digest first.
    pub const ALL: [DigestAlgorithm; 4] = [Self::Md5, Self::Sha1, Self::Blake3, Self::Sha512];

    /// Digest width in bits.
    #[must_use]
    pub fn bits(self) -> usize {
        match self {
            Self::Md5 => 128,
            Self::Sha1 => 160,
            Self::Blake3 => 256,
            Self::Sha512 => 512,
        }
    }

    /// Digest length in bytes.
    #[must_use]
    pub fn output_len(self) -> usize {
        self.bits() / 8
    }

    /// Lowercase algorithm name as used on the command line and in reports.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Blake3 => "blake3",
            Self::Sha512 => "sha512",
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "").as_str() {
            "md5" | "128" => Ok(Self::Md5),
            "sha1" | "160" => Ok(Self::Sha1),
            "blake3" | "256" => Ok(Self::Blake3),
            "sha512" | "512" => Ok(Self::Sha512),
            other => Err(format!(
                "Unknown digest algorithm '{other}' (expected one of: md5, sha1, blake3, sha512)"
            )),
        }
    }
}

/// A content digest tagged with the algorithm that produced it.
///
/// Equality and hashing include the algorithm, so a SHA-1 digest can never
/// be mistaken for an MD5 digest with coincidentally equal bytes.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest {
    algorithm: DigestAlgorithm,
    bytes: Box<[u8]>,
}

impl Digest {
    /// Wrap raw digest bytes.
    ///
    /// # Panics
    ///
    /// Debug assertion fails if `bytes` does not have the algorithm's output length.
    #[must_use]
    pub fn new(algorithm: DigestAlgorithm, bytes: impl Into<Box<[u8]>>) -> Self {
        let bytes = bytes.into();
        debug_assert_eq!(
            bytes.len(),
            algorithm.output_len(),
            "{} digest must be {} bytes",
            algorithm,
            algorithm.output_len()
        );
        Self { algorithm, bytes }
    }

    /// Algorithm that produced this digest.
    #[must_use]
    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// Raw digest bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Lowercase hexadecimal representation.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hash_to_hex(&self.bytes)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.to_hex())
    }
}

impl Serialize for Digest {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Convert digest bytes to a lowercase hexadecimal string.
#[must_use]
pub fn hash_to_hex(bytes: &[u8]) -> String {
    use fmt::Write;

    let mut hex = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(hex, "{byte:02x}");
    }
    hex
}

/// Errors that can occur while digesting a file.
#[derive(thiserror::Error, Debug)]
pub enum DigestError {
    /// The file could not be opened or read (permissions, deleted, broken link).
    #[error("Unreadable file {path}: {source}")]
    UnreadableFile {
        /// Path that failed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The byte count read differs from the size observed at scan time.
    #[error("Truncated read for {path}: expected {expected} bytes, read {actual}")]
    TruncatedRead {
        /// Path that changed
        path: PathBuf,
        /// Size recorded when the file was discovered
        expected: u64,
        /// Bytes actually read
        actual: u64,
    },

    /// Digesting stopped because shutdown was requested.
    #[error("Digest interrupted: {0}")]
    Interrupted(PathBuf),
}

impl DigestError {
    /// Path associated with this error.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::UnreadableFile { path, .. }
            | Self::TruncatedRead { path, .. }
            | Self::Interrupted(path) => path,
        }
    }
}

/// The digest primitive the duplicate finder depends on.
///
/// Implementations must be deterministic: identical byte sequences always
/// produce identical digests under the same algorithm.
pub trait Digester: Send + Sync {
    /// Algorithm this digester produces.
    fn algorithm(&self) -> DigestAlgorithm;

    /// Digest the full content of `path`.
    ///
    /// `expected_size` is the size recorded when the file was discovered;
    /// reading a different number of bytes fails with
    /// [`DigestError::TruncatedRead`].
    ///
    /// # Errors
    ///
    /// Returns [`DigestError`] if the file cannot be read or changed size.
    fn digest(&self, path: &Path, expected_size: u64) -> Result<Digest, DigestError>;
}

/// Incremental state for one of the supported algorithms.
enum DigestState {
    Md5(md5::Md5),
    Sha1(sha1::Sha1),
    Blake3(Box<blake3::Hasher>),
    Sha512(sha2::Sha512),
}

impl DigestState {
    fn new(algorithm: DigestAlgorithm) -> Self {
        match algorithm {
            DigestAlgorithm::Md5 => Self::Md5(md5::Md5::default()),
            DigestAlgorithm::Sha1 => Self::Sha1(sha1::Sha1::default()),
            DigestAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
            DigestAlgorithm::Sha512 => Self::Sha512(sha2::Sha512::default()),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Md5(h) => h.update(data),
            Self::Sha1(h) => h.update(data),
            Self::Blake3(h) => {
                h.update(data);
            }
            Self::Sha512(h) => h.update(data),
        }
    }

    fn finalize(self) -> Digest {
        match self {
            Self::Md5(h) => Digest::new(DigestAlgorithm::Md5, h.finalize().to_vec()),
            Self::Sha1(h) => Digest::new(DigestAlgorithm::Sha1, h.finalize().to_vec()),
            Self::Blake3(h) => Digest::new(DigestAlgorithm::Blake3, h.finalize().as_bytes().to_vec()),
            Self::Sha512(h) => Digest::new(DigestAlgorithm::Sha512, h.finalize().to_vec()),
        }
    }
}

/// Digest an in-memory byte slice.
///
/// # Example
///
/// ```
/// use dupefind::scanner::{digest_bytes, DigestAlgorithm};
///
/// let digest = digest_bytes(DigestAlgorithm::Md5, b"hello");
/// assert_eq!(digest.to_hex(), "5d41402abc4b2a76b9719d911017c592");
/// ```
#[must_use]
pub fn digest_bytes(algorithm: DigestAlgorithm, data: &[u8]) -> Digest {
    let mut state = DigestState::new(algorithm);
    state.update(data);
    state.finalize()
}

/// Streaming file hasher.
///
/// Reads files in fixed-size chunks so memory use stays constant regardless
/// of file size.
#[derive(Debug, Clone)]
pub struct Hasher {
    algorithm: DigestAlgorithm,
    buffer_size: usize,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new(DigestAlgorithm::default())
    }
}

impl Hasher {
    /// Create a hasher for the given algorithm.
    #[must_use]
    pub fn new(algorithm: DigestAlgorithm) -> Self {
        Self {
            algorithm,
            buffer_size: BUFFER_SIZE,
            shutdown_flag: None,
        }
    }

    /// Set the read buffer size (minimum 1 byte).
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(1);
        self
    }

    /// Set the shutdown flag checked between chunks.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Digest everything `reader` yields, returning the digest and byte count.
    ///
    /// # Errors
    ///
    /// Returns the first I/O error other than `Interrupted`.
    pub fn digest_reader<R: Read>(&self, mut reader: R) -> io::Result<(Digest, u64)> {
        let mut state = DigestState::new(self.algorithm);
        let mut buffer = vec![0u8; self.buffer_size];
        let mut total = 0u64;

        loop {
            if self.is_shutdown_requested() {
                return Err(io::Error::new(io::ErrorKind::Interrupted, "shutdown requested"));
            }
            let n = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            state.update(&buffer[..n]);
            total += n as u64;
        }

        Ok((state.finalize(), total))
    }
}

impl Digester for Hasher {
    fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    fn digest(&self, path: &Path, expected_size: u64) -> Result<Digest, DigestError> {
        let file = File::open(path).map_err(|source| DigestError::UnreadableFile {
            path: path.to_path_buf(),
            source,
        })?;

        let (digest, actual) = self.digest_reader(file).map_err(|source| {
            if self.is_shutdown_requested() {
                DigestError::Interrupted(path.to_path_buf())
            } else {
                DigestError::UnreadableFile {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        if actual != expected_size {
            log::debug!(
                "{} changed between stat and digest ({} -> {} bytes)",
                path.display(),
                expected_size,
                actual
            );
            return Err(DigestError::TruncatedRead {
                path: path.to_path_buf(),
                expected: expected_size,
                actual,
            });
        }

        log::trace!("{} {}: {}", self.algorithm, path.display(), digest);
        Ok(digest)
    }
}
