//! Per-tree duplicate index construction.

use crate::scanner::DirectoryIndex;

/// Populate the lookup tables of a scanned and digested tree.
///
/// For every record with a digest, the relative path is appended to
/// `digest_index[digest]`; the first time a digest accumulates a second
/// path it is marked duplicate. Every record, digested or errored, is
/// entered into the path and basename lookups so the diff engine can
/// still find exact-path and similar-match candidates for it.
///
/// Paths under one digest keep scan order, so duplicate listings are
/// reproducible across runs absent filesystem changes. The index is
/// considered frozen once this returns.
pub fn build_index(index: &mut DirectoryIndex) {
    for position in 0..index.files.len() {
        let rel_path = index.files[position].rel_path.clone();
        let digest = index.files[position].digest;

        if let Some(digest) = digest {
            let paths = index.digest_index.entry(digest).or_default();
            paths.push(rel_path.clone());
            if paths.len() == 2 {
                index.mark_duplicate(digest);
            }
        }

        index.path_index.insert(rel_path, position);
        index
            .basename_index
            .entry(index.files[position].basename().to_os_string())
            .or_default()
            .push(position);
    }

    log::debug!(
        "Indexed {}: {} distinct digests, {} duplicated",
        index.root.display(),
        index.digest_index.len(),
        index.duplicate_digests.len()
    );
}
