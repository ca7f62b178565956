//! Backup-diff engine.
//!
//! Given one "going" tree and N "staying" trees, report every going
//! file whose content exists in no staying tree, classified by how
//! close a candidate exists:
//!
//! 1. **exact match**: a staying tree has a file at the identical
//!    relative path (differing content: likely an edited or stale copy)
//! 2. **similar match**: same basename at a different path in some
//!    staying tree (likely moved or renamed)
//! 3. **unmatched**: neither
//!
//! A file without a digest (it failed to hash) is never assumed to be
//! backed up; it is always reported, flagged as errored.
//!
//! Known limitation, kept deliberately: similar matching compares only
//! basenames, so a common filename repeated across unrelated subtrees
//! (README.md, index.js) yields false "moved" candidates.

use std::path::PathBuf;

use serde::Serialize;

use crate::scanner::DirectoryIndex;

/// Closest candidate found for a file that is not backed up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Match {
    /// A staying tree has a file at the same relative path.
    Exact {
        /// Root of the staying tree holding the candidate.
        tree: PathBuf,
        /// The colliding relative path.
        path: PathBuf,
    },
    /// A staying tree has files with the same basename elsewhere.
    Similar {
        /// Root of the first staying tree with basename candidates.
        tree: PathBuf,
        /// Candidate relative paths in that tree, in scan order.
        paths: Vec<PathBuf>,
    },
    /// No staying tree has anything resembling this file.
    None,
}

/// One going-tree file missing from every staying tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedFile {
    /// Path relative to the going root.
    pub rel_path: PathBuf,
    /// File size in bytes.
    pub size: u64,
    /// The file could not be hashed, so its content is unknown and
    /// treated as not backed up.
    pub errored: bool,
    /// Closest candidate in the staying trees.
    pub candidate: Match,
}

/// Diff `going` against `staying`, returning the files not backed up
/// in `going`'s scan order.
///
/// A file is backed up iff its digest appears in any staying tree's
/// digest index; backed-up files are omitted from the result. Both
/// inputs must be indexed ([`super::build_index`]) and are not
/// mutated. For classification the first staying tree (in input order)
/// providing a candidate wins; candidates are never merged across
/// trees.
#[must_use]
pub fn diff_trees(going: &DirectoryIndex, staying: &[DirectoryIndex]) -> Vec<ClassifiedFile> {
    let mut result = Vec::new();

    for record in &going.files {
        let backed_up = record
            .digest
            .map(|digest| staying.iter().any(|tree| tree.contains_digest(&digest)))
            .unwrap_or(false);
        if backed_up {
            continue;
        }

        result.push(ClassifiedFile {
            rel_path: record.rel_path.clone(),
            size: record.size,
            errored: record.digest.is_none(),
            candidate: classify(record.rel_path.as_path(), staying),
        });
    }

    result
}

fn classify(rel_path: &std::path::Path, staying: &[DirectoryIndex]) -> Match {
    for tree in staying {
        if tree.record_at(rel_path).is_some() {
            return Match::Exact {
                tree: tree.root.clone(),
                path: rel_path.to_path_buf(),
            };
        }
    }

    let basename = crate::scanner::path_utils::basename(rel_path);
    for tree in staying {
        let named = tree.records_named(basename);
        if !named.is_empty() {
            return Match::Similar {
                tree: tree.root.clone(),
                paths: named.iter().map(|r| r.rel_path.clone()).collect(),
            };
        }
    }

    Match::None
}
