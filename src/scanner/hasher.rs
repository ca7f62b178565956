//! Streaming SHA-512 file hasher.
//!
//! # Overview
//!
//! Content identity in backscan is defined by the SHA-512 digest of a
//! file's full byte stream. Files are read through a large buffer so
//! multi-gigabyte files never need to fit in memory.

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest as _, Sha512};

/// Length of a SHA-512 digest in bytes.
pub const DIGEST_LEN: usize = 64;

/// Read buffer size for streaming hashing.
const READ_BUFFER: usize = 512 * 1024;

/// A whole-file SHA-512 content digest.
///
/// Digest equality is treated as content equality throughout the engine.
/// Stored in raw binary form; text encodings (hex for display, base64
/// for the portable snapshot) are produced on demand.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    /// Wrap raw digest bytes.
    #[must_use]
    pub fn new(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    /// Build a digest from a byte slice, rejecting wrong lengths.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let arr: [u8; DIGEST_LEN] = bytes.try_into().ok()?;
        Some(Self(arr))
    }

    /// Raw digest bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Standard base64 encoding, as used by the snapshot format.
    #[must_use]
    pub fn to_base64(&self) -> String {
        BASE64.encode(self.0)
    }

    /// Decode a base64 digest, rejecting malformed or short input.
    #[must_use]
    pub fn from_base64(text: &str) -> Option<Self> {
        let bytes = BASE64.decode(text).ok()?;
        Self::from_bytes(&bytes)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({self})")
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::from_base64(&text)
            .ok_or_else(|| D::Error::custom("invalid base64 SHA-512 digest"))
    }
}

/// Hash a file's full content with SHA-512.
///
/// Reads the file in [`READ_BUFFER`]-sized chunks, so memory use is
/// constant regardless of file size. Any I/O error (open or mid-stream
/// read) is returned to the caller; the digest pipeline records it and
/// moves on to the next file.
pub fn hash_file(path: &Path) -> io::Result<Digest> {
    let file = File::open(path)?;
    let mut reader = BufReader::with_capacity(READ_BUFFER, file);
    let mut hasher = Sha512::new();

    loop {
        let chunk = reader.fill_buf()?;
        if chunk.is_empty() {
            break;
        }
        hasher.update(chunk);
        let consumed = chunk.len();
        reader.consume(consumed);
    }

    let bytes = hasher.finalize();
    let mut out = [0u8; DIGEST_LEN];
    out.copy_from_slice(&bytes);
    Ok(Digest(out))
}
