//! Recursive directory walker with subtree pruning.
//!
//! # Overview
//!
//! [`Walker::scan`] lists every regular file under a root. The ignore
//! predicate is evaluated against each directory before descending, so
//! an ignored directory's contents are never even listed, and against
//! each file individually. Stat and listing errors are recorded in the
//! index's `errored` set and never abort the walk.
//!
//! The resulting file list is sorted by
//! [`path_utils::scan_order`](super::path_utils::scan_order): files
//! directly under a directory before files nested deeper, lexicographic
//! otherwise.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use walkdir::WalkDir;

use super::{path_utils, DirectoryIndex, FileRecord, IgnorePredicate, ScanError};
use crate::cache::FileTimestamp;
use crate::progress::{ProgressCallback, ProgressEvent};

/// Directory walker for one scan root.
pub struct Walker<'a> {
    root: PathBuf,
    ignore: &'a dyn IgnorePredicate,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl<'a> Walker<'a> {
    /// Create a walker for `root` with the given ignore predicate.
    #[must_use]
    pub fn new(root: &Path, ignore: &'a dyn IgnorePredicate) -> Self {
        Self {
            root: root.to_path_buf(),
            ignore,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination. When the flag
    /// becomes `true`, the walk stops between entries and the partial
    /// index is discarded.
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

    /// Walk the tree and produce a [`DirectoryIndex`] with records in
    /// scan order. Emits one progress event per discovered file.
    ///
    /// A root that does not exist, or is neither a directory nor a
    /// regular file (following symlinks), fails with
    /// [`ScanError::InvalidRoot`]. Everything below the root is
    /// best-effort: unreadable entries land in `errored`.
    pub fn scan(&self, progress: &dyn ProgressCallback) -> Result<DirectoryIndex, ScanError> {
        let meta = fs::metadata(&self.root).map_err(|source| ScanError::InvalidRoot {
            path: self.root.clone(),
            source,
        })?;

        let mut index = DirectoryIndex::new(self.root.clone());
        progress.on_phase_start("scan", 0);

        if meta.is_file() {
            // A single-file root produces a one-record tree.
            let rel = self
                .root
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_else(|| self.root.clone());
            self.record_file(&mut index, rel, &meta, progress);
            progress.on_phase_end("scan");
            return Ok(index);
        }
        if !meta.is_dir() {
            return Err(ScanError::InvalidRoot {
                path: self.root.clone(),
                source: std::io::Error::other("not a file or directory"),
            });
        }

        let entries = WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| self.keep_entry(entry));

        for entry in entries {
            if self.is_shutdown_requested() {
                log::debug!("Walker: shutdown requested, abandoning scan");
                return Err(ScanError::Interrupted);
            }

            match entry {
                Ok(entry) => {
                    if !entry.file_type().is_file() {
                        continue;
                    }
                    let rel = self.relative(entry.path());
                    match entry.metadata() {
                        Ok(meta) => {
                            self.record_file(&mut index, rel, &meta, progress);
                        }
                        Err(e) => {
                            log::warn!("Failed to stat {}: {}", entry.path().display(), e);
                            index.errored.insert(rel);
                        }
                    }
                }
                Err(e) => {
                    let rel = e
                        .path()
                        .map(|p| self.relative(p))
                        .unwrap_or_else(|| PathBuf::from("."));
                    log::warn!("Walk error under {}: {}", self.root.display(), e);
                    index.errored.insert(rel);
                }
            }
        }

        index
            .files
            .sort_by(|a, b| path_utils::scan_order(&a.rel_path, &b.rel_path));

        progress.on_phase_end("scan");
        log::debug!(
            "Scanned {}: {} files, {} errors",
            self.root.display(),
            index.files.len(),
            index.errored.len()
        );
        Ok(index)
    }

    /// Predicate hook for walkdir. Returning false for a directory
    /// prunes its whole subtree; for a file it drops just that file.
    fn keep_entry(&self, entry: &walkdir::DirEntry) -> bool {
        if entry.depth() == 0 {
            return true;
        }
        let rel = self.relative(entry.path());
        let is_dir = entry.file_type().is_dir();
        let ignored = self.ignore.is_ignored(entry.path(), &rel, is_dir);
        if ignored {
            log::trace!(
                "Ignoring {} {}",
                if is_dir { "directory" } else { "file" },
                rel.display()
            );
        }
        !ignored
    }

    fn relative(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.root).unwrap_or(path).to_path_buf()
    }

    fn record_file(
        &self,
        index: &mut DirectoryIndex,
        rel: PathBuf,
        meta: &fs::Metadata,
        progress: &dyn ProgressCallback,
    ) {
        let mtime = FileTimestamp::from(meta.modified().unwrap_or(SystemTime::UNIX_EPOCH));
        index
            .files
            .push(FileRecord::new(rel.clone(), meta.len(), mtime));

        progress.on_file_discovered(&ProgressEvent {
            files_seen: index.files.len(),
            estimated_total: index.files.len() + 1,
            current_path: &rel,
        });
    }
}
