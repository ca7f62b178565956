//! Persistent fingerprint cache.
//!
//! Scanning a large tree is cheap; hashing every byte of it on every
//! run is not. The cache remembers the SHA-512 digest of each file,
//! keyed by absolute path, and hands it back as long as the file's
//! size (and, when requested, modification time) is unchanged.
//!
//! # Architecture
//!
//! * [`database`]: SQLite persistence and the lookup/store contract.
//! * [`entry`]: the stored data model and its validity rule.
//! * [`snapshot`]: a versioned JSON document for moving a cache
//!   between machines.
//!
//! # Invalidation
//!
//! An entry is valid for a file iff the stored size matches. Callers
//! that pass a modification time additionally require an exact match,
//! sub-second remainder included; the digest pipeline deliberately
//! validates by size only, matching imported snapshots whose mtimes
//! come from other machines' clocks.

pub mod database;
pub mod entry;
pub mod snapshot;

pub use database::{CacheError, CacheResult, FingerprintCache};
pub use entry::{CacheEntry, FileTimestamp};
pub use snapshot::SNAPSHOT_VERSION;
