//! Gitignore-style implementation of [`IgnorePredicate`].
//!
//! Built on the `ignore` crate's glob matcher (the same engine ripgrep
//! uses). Patterns are matched against the path relative to the
//! scanned root; directory patterns prune whole subtrees in the walker.
//! Absolute-path patterns are not supported: the absolute argument is
//! consulted only as a fallback source for the relative path, so the
//! same pattern set means the same thing under every scan root.

use std::path::{Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};

use super::IgnorePredicate;

/// Glob-based ignore predicate for one scan root.
#[derive(Debug)]
pub struct GlobIgnore {
    root: PathBuf,
    matcher: Option<Gitignore>,
}

impl GlobIgnore {
    /// Compile `patterns` for paths under `root`.
    ///
    /// Invalid patterns are logged and skipped rather than failing the
    /// scan; with no usable patterns the predicate ignores nothing.
    #[must_use]
    pub fn new(root: &Path, patterns: &[String]) -> Self {
        let mut builder = GitignoreBuilder::new(root);
        for pattern in patterns {
            if let Err(e) = builder.add_line(None, pattern) {
                log::warn!("Unable to compile ignore pattern '{}': {}", pattern, e);
            }
        }

        let matcher = match builder.build() {
            Ok(gitignore) if !gitignore.is_empty() => Some(gitignore),
            Ok(_) => None,
            Err(e) => {
                log::warn!("Failed to build ignore patterns: {}", e);
                None
            }
        };

        Self {
            root: root.to_path_buf(),
            matcher,
        }
    }

    /// Predicate that ignores nothing.
    #[must_use]
    pub fn none(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            matcher: None,
        }
    }
}

impl IgnorePredicate for GlobIgnore {
    fn is_ignored(&self, absolute: &Path, relative: &Path, is_dir: bool) -> bool {
        let Some(matcher) = &self.matcher else {
            return false;
        };

        // Gitignore matching expects paths relative to the root with
        // forward slashes even on Windows.
        let relative = if relative.as_os_str().is_empty() {
            absolute.strip_prefix(&self.root).unwrap_or(absolute)
        } else {
            relative
        };
        let path_str = relative.to_string_lossy();
        let normalized = if cfg!(windows) {
            path_str.replace('\\', "/")
        } else {
            path_str.into_owned()
        };

        matcher.matched(normalized, is_dir).is_ignore()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn predicate(patterns: &[&str]) -> GlobIgnore {
        let patterns: Vec<String> = patterns.iter().map(|s| s.to_string()).collect();
        GlobIgnore::new(Path::new("/scan"), &patterns)
    }

    #[test]
    fn test_file_glob() {
        let pred = predicate(&["*.tmp"]);
        assert!(pred.is_ignored(Path::new("/scan/a.tmp"), Path::new("a.tmp"), false));
        assert!(pred.is_ignored(
            Path::new("/scan/sub/b.tmp"),
            Path::new("sub/b.tmp"),
            false
        ));
        assert!(!pred.is_ignored(Path::new("/scan/a.txt"), Path::new("a.txt"), false));
    }

    #[test]
    fn test_directory_pattern_matches_directory() {
        let pred = predicate(&["node_modules/"]);
        assert!(pred.is_ignored(
            Path::new("/scan/node_modules"),
            Path::new("node_modules"),
            true
        ));
        // Trailing-slash patterns apply to directories only.
        assert!(!pred.is_ignored(
            Path::new("/scan/node_modules"),
            Path::new("node_modules"),
            false
        ));
    }

    #[test]
    fn test_no_patterns_ignores_nothing() {
        let pred = predicate(&[]);
        assert!(!pred.is_ignored(Path::new("/scan/x"), Path::new("x"), false));

        let none = GlobIgnore::none(Path::new("/scan"));
        assert!(!none.is_ignored(Path::new("/scan/x"), Path::new("x"), true));
    }

    #[test]
    fn test_relative_path_alone_decides() {
        let pred = predicate(&["*.tmp", "/etc/passwd"]);
        // The absolute path never matches on its own, rooted patterns
        // included.
        assert!(!pred.is_ignored(Path::new("/etc/passwd"), Path::new("a.txt"), false));
        assert!(pred.is_ignored(Path::new("/elsewhere/a.tmp"), Path::new("a.tmp"), false));
    }

    #[test]
    fn test_invalid_pattern_is_skipped() {
        // A lone "!" is not a valid gitignore line; the rest still works.
        let pred = predicate(&["!", "*.log"]);
        assert!(pred.is_ignored(Path::new("/scan/a.log"), Path::new("a.log"), false));
    }
}
