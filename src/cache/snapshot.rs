//! Portable cache snapshot format.
//!
//! The snapshot is a versioned JSON document used to move a fingerprint
//! cache between machines:
//!
//! ```json
//! {
//!   "version": 1,
//!   "files": [
//!     ["/abs/path", {"size": 5, "mtime": 1700000000123, "digest": "<base64>"}]
//!   ]
//! }
//! ```
//!
//! `mtime` is epoch milliseconds. Loading a snapshot with any other
//! version fails with [`CacheError::VersionMismatch`]; since clock
//! precision and skew differ between machines, imported entries are
//! expected to be validated by size only.

use serde::{Deserialize, Serialize};

use super::database::CacheError;
use super::entry::{CacheEntry, FileTimestamp};
use crate::scanner::Digest;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Only the version field, readable from any snapshot generation.
#[derive(Deserialize)]
struct SnapshotHeader {
    version: u32,
}

#[derive(Serialize, Deserialize)]
struct SnapshotDocument {
    version: u32,
    files: Vec<(String, SnapshotEntry)>,
}

#[derive(Serialize, Deserialize)]
struct SnapshotEntry {
    size: u64,
    /// Epoch milliseconds.
    mtime: i64,
    /// Base64-encoded SHA-512 digest.
    digest: String,
}

/// Parse a snapshot document into `(fullpath, entry)` pairs.
///
/// The version is checked before the body, so a future-format snapshot
/// fails with [`CacheError::VersionMismatch`] rather than a parse error.
pub fn parse(text: &str) -> Result<Vec<(String, CacheEntry)>, CacheError> {
    let header: SnapshotHeader = serde_json::from_str(text)?;
    if header.version != SNAPSHOT_VERSION {
        return Err(CacheError::VersionMismatch {
            found: header.version,
            expected: SNAPSHOT_VERSION,
        });
    }

    let doc: SnapshotDocument = serde_json::from_str(text)?;
    let mut entries = Vec::with_capacity(doc.files.len());
    for (fullpath, raw) in doc.files {
        let digest = Digest::from_base64(&raw.digest).ok_or_else(|| {
            CacheError::Malformed(format!("invalid digest for {fullpath}"))
        })?;
        entries.push((
            fullpath,
            CacheEntry {
                size: raw.size,
                mtime: FileTimestamp::from_epoch_millis(raw.mtime),
                digest,
            },
        ));
    }
    Ok(entries)
}

/// Render `(fullpath, entry)` pairs as a snapshot document.
pub fn render<'a, I>(entries: I) -> Result<String, CacheError>
where
    I: IntoIterator<Item = (String, &'a CacheEntry)>,
{
    let files = entries
        .into_iter()
        .map(|(fullpath, entry)| {
            (
                fullpath,
                SnapshotEntry {
                    size: entry.size,
                    mtime: entry.mtime.to_epoch_millis(),
                    digest: entry.digest.to_base64(),
                },
            )
        })
        .collect();

    let doc = SnapshotDocument {
        version: SNAPSHOT_VERSION,
        files,
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}
