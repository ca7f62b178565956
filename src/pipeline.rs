//! Digest pipeline: fills in content digests for a scanned tree.
//!
//! For each record, in scan order: consult the fingerprint cache by
//! `(absolute path, size)`; on a hit reuse the cached digest without
//! opening the file, on a miss stream the file through SHA-512 and
//! store the result back. A file that fails to read is added to the
//! tree's `errored` set and left without a digest; the batch continues.
//!
//! Files are digested one at a time, each completing (including the
//! cache write) before the next begins. Hashing is I/O-bound, and
//! unbounded fan-out would mostly risk descriptor exhaustion; a pool
//! would have to bound open files and re-sort results into scan order.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::cache::FingerprintCache;
use crate::progress::{ProgressCallback, ProgressEvent};
use crate::scanner::{hash_file, DirectoryIndex, ScanError};

/// Counters from one digest pass over a tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DigestStats {
    /// Records that entered the pass.
    pub total: usize,
    /// Digests reused from the cache.
    pub cache_hits: usize,
    /// Files hashed from disk.
    pub hashed: usize,
    /// Files that failed to read; they carry no digest.
    pub failed: usize,
}

/// Digest every record in `index`, consulting and updating `cache`.
///
/// Emits one progress event per file. Checks `shutdown_flag` between
/// files; on interruption the partially digested index must be
/// discarded by the caller, never handed to the duplicate indexer.
pub fn digest_tree(
    index: &mut DirectoryIndex,
    cache: &FingerprintCache,
    progress: &dyn ProgressCallback,
    shutdown_flag: Option<&Arc<AtomicBool>>,
) -> Result<DigestStats, ScanError> {
    let mut stats = DigestStats {
        total: index.files.len(),
        ..DigestStats::default()
    };

    progress.on_phase_start("digest", index.files.len());

    for position in 0..index.files.len() {
        if shutdown_flag.is_some_and(|f| f.load(Ordering::SeqCst)) {
            log::debug!(
                "Digest pass for {} interrupted at file {}/{}",
                index.root.display(),
                position,
                stats.total
            );
            return Err(ScanError::Interrupted);
        }

        let record = &index.files[position];
        let abs_path = index.abs_path(record);
        let rel_path = record.rel_path.clone();
        let size = record.size;
        let mtime = record.mtime;

        progress.on_file_digested(&ProgressEvent {
            files_seen: position + 1,
            estimated_total: stats.total,
            current_path: &rel_path,
        });

        // Size-only validation: snapshot imports carry mtimes from
        // other machines' clocks, and those hits must still count.
        if let Some(cached) = cache.lookup(&abs_path, size, None) {
            index.files[position].digest = Some(cached);
            stats.cache_hits += 1;
            continue;
        }

        match hash_file(&abs_path) {
            Ok(digest) => {
                index.files[position].digest = Some(digest);
                stats.hashed += 1;
                if let Err(e) = cache.store(&abs_path, size, mtime, &digest) {
                    // Cache durability is best-effort; the digest is
                    // already on the record.
                    log::warn!("Failed to cache digest for {}: {}", abs_path.display(), e);
                }
            }
            Err(e) => {
                log::warn!("Failed to hash {}: {}", abs_path.display(), e);
                index.errored.insert(rel_path);
                stats.failed += 1;
            }
        }
    }

    progress.on_phase_end("digest");
    log::debug!(
        "Digested {}: {} cached, {} hashed, {} failed",
        index.root.display(),
        stats.cache_hits,
        stats.hashed,
        stats.failed
    );
    Ok(stats)
}
