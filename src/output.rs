//! Report rendering and atomic report output.
//!
//! The not-backed-up report is a flat line-per-file listing with a
//! one-character indicator column:
//!
//! ```text
//! x docs/notes.txt      same path exists in a staying tree (stale copy?)
//! - photos/img_01.jpg   same basename elsewhere (moved or renamed?)
//!   scratch/tmp.dat     no candidate anywhere
//! ! broken.dat          could not be hashed; never assumed backed up
//! ```
//!
//! Writing a report to a file backs up any existing file by renaming it
//! to `<name>~` first, so a rerun never silently destroys the previous
//! report.

use std::fs::{self, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::duplicates::{ClassifiedFile, Match};
use crate::scanner::DirectoryIndex;

/// JSON report envelope.
#[derive(Debug, Serialize)]
struct Report<'a> {
    going: &'a Path,
    staying: Vec<&'a Path>,
    missing: &'a [ClassifiedFile],
}

fn indicator(file: &ClassifiedFile) -> char {
    if file.errored {
        return '!';
    }
    match file.candidate {
        Match::Exact { .. } => 'x',
        Match::Similar { .. } => '-',
        Match::None => ' ',
    }
}

/// Render the diff result as the flat text report.
#[must_use]
pub fn render_text(missing: &[ClassifiedFile]) -> String {
    let mut out = String::new();
    for file in missing {
        out.push(indicator(file));
        out.push(' ');
        out.push_str(&file.rel_path.display().to_string());
        out.push('\n');
    }
    out
}

/// Render the diff result as pretty-printed JSON.
pub fn render_json(
    going: &DirectoryIndex,
    staying: &[DirectoryIndex],
    missing: &[ClassifiedFile],
) -> serde_json::Result<String> {
    let report = Report {
        going: &going.root,
        staying: staying.iter().map(|t| t.root.as_path()).collect(),
        missing,
    };
    serde_json::to_string_pretty(&report)
}

/// Render one tree's duplicate groups: each duplicated digest followed
/// by its member paths, groups in first-seen order, members in scan
/// order.
#[must_use]
pub fn render_duplicates(index: &DirectoryIndex) -> String {
    if index.duplicate_digests.is_empty() {
        return format!("no duplicates in {}.\n", index.root.display());
    }

    let mut out = format!(
        "{} duplicate groups in {}:\n",
        index.duplicate_digests.len(),
        index.root.display()
    );
    for digest in &index.duplicate_digests {
        out.push_str(&digest.to_string());
        out.push('\n');
        if let Some(paths) = index.digest_index.get(digest) {
            for path in paths {
                out.push('\t');
                out.push_str(&path.display().to_string());
                out.push('\n');
            }
        }
    }
    out
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push("~");
    path.with_file_name(name)
}

/// Write `contents` to `path`, creating missing parent directories and
/// moving any existing file aside to `<name>~` first.
///
/// Returns whether a previous file was moved to the backup name.
pub fn write_with_backup(path: &Path, contents: &str) -> io::Result<bool> {
    let mut backed_up = false;
    let mut created_dirs = false;

    loop {
        match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(mut file) => {
                file.write_all(contents.as_bytes())?;
                return Ok(backed_up);
            }
            Err(e) if e.kind() == ErrorKind::NotFound && !created_dirs => {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                created_dirs = true;
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists && !backed_up => {
                let backup = backup_path(path);
                fs::rename(path, &backup)?;
                log::debug!(
                    "Moved existing {} to {}",
                    path.display(),
                    backup.display()
                );
                backed_up = true;
            }
            Err(e) => return Err(e),
        }
    }
}
