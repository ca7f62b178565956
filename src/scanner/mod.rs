//! Directory scanning and file fingerprinting.
//!
//! This module owns file discovery and the data model the rest of the
//! engine consumes:
//!
//! - [`walker`]: recursive directory traversal with subtree pruning
//! - [`hasher`]: streaming SHA-512 digests
//! - [`ignore`]: the gitignore-style implementation of [`IgnorePredicate`]
//! - [`path_utils`]: the scan ordering rule
//!
//! A scan of one root produces a [`DirectoryIndex`]: the ordered file
//! list plus the lookup tables the duplicate indexer fills in after the
//! digest pass.

pub mod hasher;
pub mod ignore;
pub mod path_utils;
pub mod walker;

use std::collections::{BTreeSet, HashMap, HashSet};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

pub use hasher::{hash_file, Digest, DIGEST_LEN};
pub use ignore::GlobIgnore;
pub use walker::Walker;

use crate::cache::FileTimestamp;

/// Metadata for one discovered regular file.
///
/// `digest` is absent until the digest pipeline runs; a changed file
/// is represented by a fresh record on the next scan, never by
/// mutating an existing digest.
#[derive(Debug, Clone)]
pub struct FileRecord {
    /// Path relative to the scanned root; unique within one scan.
    pub rel_path: PathBuf,
    /// File size in bytes.
    pub size: u64,
    /// Last modification time.
    pub mtime: FileTimestamp,
    /// SHA-512 content digest, once computed.
    pub digest: Option<Digest>,
}

impl FileRecord {
    /// Create a record with no digest yet.
    #[must_use]
    pub fn new(rel_path: PathBuf, size: u64, mtime: FileTimestamp) -> Self {
        Self {
            rel_path,
            size,
            mtime,
            digest: None,
        }
    }

    /// Final path component, used for similar-match candidates.
    #[must_use]
    pub fn basename(&self) -> &OsStr {
        path_utils::basename(&self.rel_path)
    }
}

/// In-memory result of scanning (and later digesting) one root tree.
///
/// Created empty at scan start, populated by [`Walker::scan`] and the
/// digest pipeline, then finalized by
/// [`crate::duplicates::build_index`], which fills the lookup tables.
/// Read-only from then on.
#[derive(Debug)]
pub struct DirectoryIndex {
    /// The scanned root.
    pub root: PathBuf,
    /// File records in scan order.
    pub files: Vec<FileRecord>,
    /// Relative path -> index into `files`.
    pub path_index: HashMap<PathBuf, usize>,
    /// Digest -> relative paths sharing it, in scan order.
    pub digest_index: HashMap<Digest, Vec<PathBuf>>,
    /// Digests with two or more paths, in first-seen order.
    pub duplicate_digests: Vec<Digest>,
    /// Basename -> indices into `files`.
    pub basename_index: HashMap<OsString, Vec<usize>>,
    /// Relative paths that failed to stat, list, or hash.
    pub errored: BTreeSet<PathBuf>,
    duplicate_set: HashSet<Digest>,
}

impl DirectoryIndex {
    /// Create an empty index for `root`.
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            files: Vec::new(),
            path_index: HashMap::new(),
            digest_index: HashMap::new(),
            duplicate_digests: Vec::new(),
            basename_index: HashMap::new(),
            errored: BTreeSet::new(),
            duplicate_set: HashSet::new(),
        }
    }

    /// Absolute path of a record under this root.
    #[must_use]
    pub fn abs_path(&self, record: &FileRecord) -> PathBuf {
        self.root.join(&record.rel_path)
    }

    /// Whether any file in this tree carries `digest`.
    #[must_use]
    pub fn contains_digest(&self, digest: &Digest) -> bool {
        self.digest_index.contains_key(digest)
    }

    /// Whether `digest` is shared by two or more files in this tree.
    #[must_use]
    pub fn is_duplicate(&self, digest: &Digest) -> bool {
        self.duplicate_set.contains(digest)
    }

    /// Record at an exact relative path, if any.
    #[must_use]
    pub fn record_at(&self, rel_path: &Path) -> Option<&FileRecord> {
        self.path_index.get(rel_path).map(|&i| &self.files[i])
    }

    /// Records sharing a basename, in scan order.
    #[must_use]
    pub fn records_named(&self, basename: &OsStr) -> Vec<&FileRecord> {
        self.basename_index
            .get(basename)
            .map(|indices| indices.iter().map(|&i| &self.files[i]).collect())
            .unwrap_or_default()
    }

    pub(crate) fn mark_duplicate(&mut self, digest: Digest) {
        if self.duplicate_set.insert(digest) {
            self.duplicate_digests.push(digest);
        }
    }
}

/// Decides whether a path is excluded from a scan.
///
/// Evaluated against a directory (with `is_dir = true`) before
/// descending into it, and against each regular file. The walker is
/// independent of any pattern syntax; [`GlobIgnore`] supplies the
/// gitignore-style implementation, and closures work for tests.
pub trait IgnorePredicate {
    /// Returns true if the entry should be excluded.
    fn is_ignored(&self, absolute: &Path, relative: &Path, is_dir: bool) -> bool;
}

impl<F> IgnorePredicate for F
where
    F: Fn(&Path, &Path, bool) -> bool,
{
    fn is_ignored(&self, absolute: &Path, relative: &Path, is_dir: bool) -> bool {
        self(absolute, relative, is_dir)
    }
}

/// Errors that abort a tree scan.
///
/// Per-file I/O problems are not here: they land in
/// [`DirectoryIndex::errored`] and never abort the walk.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// The scan target does not exist or is not a file, directory, or
    /// symlink to one. Fatal for this root only; callers collect these
    /// across roots and report after all roots were attempted.
    #[error("invalid scan root {path}: {source}")]
    InvalidRoot {
        /// The offending root.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The scan or digest pass was abandoned between files. The
    /// partially populated index must be discarded, never indexed.
    #[error("interrupted")]
    Interrupted,
}
