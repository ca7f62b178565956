//! Duplicate indexing and backup-diff classification.
//!
//! - [`indexer`]: builds the per-tree digest, path, and basename
//!   lookups after the digest pass.
//! - [`diff`]: classifies each file of a "going" tree by whether its
//!   content exists in any "staying" tree.

pub mod diff;
pub mod indexer;

pub use diff::{diff_trees, ClassifiedFile, Match};
pub use indexer::build_index;
