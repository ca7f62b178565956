//! Path ordering and naming helpers.

use std::cmp::Ordering;
use std::ffi::OsStr;
use std::path::Path;

/// Compare two relative paths in scan order.
///
/// After stripping the longest common leading components, a path that
/// is a direct child of the shared directory sorts before one that
/// descends into a subdirectory; otherwise ordering is lexicographic.
/// The net effect: files directly under a directory come before files
/// nested below it, at every level.
///
/// This ordering is policy rather than correctness; duplicate and diff
/// output order follows it, so it is pinned by tests.
#[must_use]
pub fn scan_order(a: &Path, b: &Path) -> Ordering {
    let components_a: Vec<&OsStr> = a.iter().collect();
    let components_b: Vec<&OsStr> = b.iter().collect();

    let mut common = 0;
    while common < components_a.len()
        && common < components_b.len()
        && components_a[common] == components_b[common]
    {
        common += 1;
    }

    let rest_a = components_a.len() - common;
    let rest_b = components_b.len() - common;

    if rest_a <= 1 && rest_b <= 1 {
        return a.cmp(b);
    }
    if rest_a == 1 {
        return Ordering::Less;
    }
    if rest_b == 1 {
        return Ordering::Greater;
    }
    a.cmp(b)
}

/// Final path component, used for similar-match candidate lookup.
#[must_use]
pub fn basename(path: &Path) -> &OsStr {
    path.file_name().unwrap_or_else(|| path.as_os_str())
}
