//! SQLite-backed fingerprint cache.
//!
//! One logical table keyed by absolute path:
//!
//! ```sql
//! files(fullpath TEXT PRIMARY KEY, size INTEGER, mtime_seconds INTEGER,
//!       mtime_subsecond_remainder INTEGER, digest BLOB)
//! ```
//!
//! Digests are stored as raw 64-byte blobs. Lookups never error: any
//! storage problem is logged and reported as a miss, so a damaged cache
//! costs re-hashing time, never correctness. If the on-disk store
//! cannot be opened the cache falls back to an in-memory connection for
//! the run (no durability, same behavior).

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};

use super::entry::{CacheEntry, FileTimestamp};
use super::snapshot;
use crate::scanner::Digest;

/// Errors from the fingerprint cache.
#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    /// A snapshot was produced by an incompatible format version.
    #[error("cache snapshot version {found} is not supported (expected {expected})")]
    VersionMismatch {
        /// Version embedded in the snapshot.
        found: u32,
        /// Version this engine reads and writes.
        expected: u32,
    },

    /// The persistent store could not be opened.
    #[error("cache store unavailable at {path}: {source}")]
    Unavailable {
        /// Location of the store that failed to open.
        path: String,
        /// The underlying SQLite error.
        #[source]
        source: rusqlite::Error,
    },

    /// An underlying SQLite operation failed.
    #[error("cache storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// A snapshot could not be parsed as JSON.
    #[error("malformed cache snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// A snapshot parsed as JSON but carried invalid data.
    #[error("malformed cache snapshot: {0}")]
    Malformed(String),

    /// The cache was used after `close`.
    #[error("cache is closed")]
    Closed,
}

/// Convenience result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Persistent path -> (size, mtime, digest) store.
///
/// `lookup` and `store` are independently atomic per path: the
/// connection sits behind a mutex, so concurrent digest operations may
/// share one cache, with last-store-wins semantics per path.
pub struct FingerprintCache {
    conn: Mutex<Option<Connection>>,
    durable: bool,
}

impl FingerprintCache {
    /// Open or create the cache database at `path`.
    pub fn open(path: &Path) -> CacheResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    log::debug!(
                        "Could not create cache directory {}: {}",
                        parent.display(),
                        e
                    );
                }
            }
        }

        let conn = Connection::open(path).map_err(|source| CacheError::Unavailable {
            path: path.display().to_string(),
            source,
        })?;
        Self::init_schema(&conn)?;

        log::debug!("Opened fingerprint cache at {}", path.display());
        Ok(Self {
            conn: Mutex::new(Some(conn)),
            durable: true,
        })
    }

    /// Create an in-memory cache with no durability.
    pub fn in_memory() -> CacheResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(Some(conn)),
            durable: false,
        })
    }

    /// Open the on-disk cache, degrading to an in-memory cache if the
    /// store is unavailable. The run still works; digests computed this
    /// run are simply not remembered.
    pub fn open_or_memory(path: &Path) -> CacheResult<Self> {
        match Self::open(path) {
            Ok(cache) => Ok(cache),
            Err(e) => {
                log::warn!("{e}; continuing with an in-memory cache");
                Self::in_memory()
            }
        }
    }

    fn init_schema(conn: &Connection) -> CacheResult<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS files (
                fullpath TEXT PRIMARY KEY,
                size INTEGER NOT NULL,
                mtime_seconds INTEGER NOT NULL,
                mtime_subsecond_remainder INTEGER NOT NULL,
                digest BLOB NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Whether stores persist beyond this process.
    #[must_use]
    pub fn is_durable(&self) -> bool {
        self.durable
    }

    /// Look up a cached digest for `path`.
    ///
    /// Returns the digest only if an entry exists and its recorded size
    /// equals `size`; when `mtime` is supplied the stored timestamp
    /// must also match exactly, sub-second remainder included. Never
    /// errors: storage failures are logged and reported as a miss.
    pub fn lookup(&self, path: &Path, size: u64, mtime: Option<FileTimestamp>) -> Option<Digest> {
        let entry = match self.fetch(path) {
            Ok(entry) => entry?,
            Err(e) => {
                log::warn!("Cache lookup failed for {}: {}", path.display(), e);
                return None;
            }
        };

        if entry.matches(size, mtime) {
            Some(entry.digest)
        } else {
            None
        }
    }

    fn fetch(&self, path: &Path) -> CacheResult<Option<CacheEntry>> {
        let guard = self.conn.lock().unwrap();
        let conn = guard.as_ref().ok_or(CacheError::Closed)?;

        let key = path.to_string_lossy();
        let row = conn
            .query_row(
                "SELECT size, mtime_seconds, mtime_subsecond_remainder, digest
                 FROM files WHERE fullpath = ?1",
                params![key],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, Vec<u8>>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((size, seconds, subsec, digest_bytes)) = row else {
            return Ok(None);
        };
        let Some(digest) = Digest::from_bytes(&digest_bytes) else {
            // Truncated blob from an older or damaged database.
            log::warn!(
                "Discarding cache entry with {}-byte digest for {}",
                digest_bytes.len(),
                path.display()
            );
            return Ok(None);
        };

        Ok(Some(CacheEntry {
            size: size as u64,
            mtime: FileTimestamp {
                seconds,
                subsec_nanos: subsec as u32,
            },
            digest,
        }))
    }

    /// Upsert the entry for `path`. A later store for the same path
    /// always supersedes an earlier one.
    pub fn store(
        &self,
        path: &Path,
        size: u64,
        mtime: FileTimestamp,
        digest: &Digest,
    ) -> CacheResult<()> {
        let guard = self.conn.lock().unwrap();
        let conn = guard.as_ref().ok_or(CacheError::Closed)?;

        conn.execute(
            "INSERT OR REPLACE INTO files
             (fullpath, size, mtime_seconds, mtime_subsecond_remainder, digest)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                path.to_string_lossy(),
                size as i64,
                mtime.seconds,
                i64::from(mtime.subsec_nanos),
                digest.as_bytes().as_slice(),
            ],
        )?;
        Ok(())
    }

    /// Replace all in-store state from a snapshot document.
    ///
    /// Fails with [`CacheError::VersionMismatch`] before touching any
    /// stored entries if the snapshot version is not supported.
    pub fn load_snapshot(&self, text: &str) -> CacheResult<()> {
        let entries = snapshot::parse(text)?;

        let mut guard = self.conn.lock().unwrap();
        let conn = guard.as_mut().ok_or(CacheError::Closed)?;

        let tx = conn.transaction()?;
        tx.execute("DELETE FROM files", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO files
                 (fullpath, size, mtime_seconds, mtime_subsecond_remainder, digest)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for (fullpath, entry) in &entries {
                stmt.execute(params![
                    fullpath,
                    entry.size as i64,
                    entry.mtime.seconds,
                    i64::from(entry.mtime.subsec_nanos),
                    entry.digest.as_bytes().as_slice(),
                ])?;
            }
        }
        tx.commit()?;

        log::info!("Loaded {} entries from cache snapshot", entries.len());
        Ok(())
    }

    /// Serialize all entries to the portable snapshot format.
    pub fn dump_snapshot(&self) -> CacheResult<String> {
        let guard = self.conn.lock().unwrap();
        let conn = guard.as_ref().ok_or(CacheError::Closed)?;

        let mut stmt = conn.prepare(
            "SELECT fullpath, size, mtime_seconds, mtime_subsecond_remainder, digest
             FROM files",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, Vec<u8>>(4)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (fullpath, size, seconds, subsec, digest_bytes) = row?;
            let Some(digest) = Digest::from_bytes(&digest_bytes) else {
                log::warn!("Skipping cache entry with invalid digest for {fullpath}");
                continue;
            };
            entries.push((
                fullpath,
                CacheEntry {
                    size: size as u64,
                    mtime: FileTimestamp {
                        seconds,
                        subsec_nanos: subsec as u32,
                    },
                    digest,
                },
            ));
        }

        snapshot::render(entries.iter().map(|(p, e)| (p.clone(), e)))
    }

    /// Number of stored entries.
    pub fn len(&self) -> CacheResult<usize> {
        let guard = self.conn.lock().unwrap();
        let conn = guard.as_ref().ok_or(CacheError::Closed)?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM files", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> CacheResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Flush pending writes and release the storage handle.
    ///
    /// Safe to call more than once and safe to call when nothing was
    /// written; subsequent lookups and stores report [`CacheError::Closed`].
    pub fn close(&self) -> CacheResult<()> {
        let conn = self.conn.lock().unwrap().take();
        if let Some(conn) = conn {
            conn.close().map_err(|(_, e)| CacheError::Storage(e))?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for FingerprintCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FingerprintCache")
            .field("durable", &self.durable)
            .finish_non_exhaustive()
    }
}
