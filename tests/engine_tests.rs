use backscan::cache::FingerprintCache;
use backscan::duplicates::{build_index, diff_trees, Match};
use backscan::output::{render_duplicates, render_json, render_text};
use backscan::pipeline::digest_tree;
use backscan::progress::NullProgress;
use backscan::scanner::{DirectoryIndex, GlobIgnore, Walker};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tempfile::tempdir;

fn never(_abs: &Path, _rel: &Path, _is_dir: bool) -> bool {
    false
}

fn write_file(path: &Path, content: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    File::create(path).unwrap().write_all(content).unwrap();
}

fn index_tree(root: &Path) -> DirectoryIndex {
    let cache = FingerprintCache::in_memory().unwrap();
    let mut index = Walker::new(root, &never).scan(&NullProgress).unwrap();
    digest_tree(&mut index, &cache, &NullProgress, None).unwrap();
    build_index(&mut index);
    index
}

#[test]
fn test_identical_trees_produce_empty_report() {
    let going = tempdir().unwrap();
    let staying = tempdir().unwrap();
    write_file(&going.path().join("docs/notes.txt"), b"hello");
    write_file(&staying.path().join("archive/old.txt"), b"hello");

    let going = index_tree(going.path());
    let staying = [index_tree(staying.path())];

    // Content match counts regardless of name or location.
    let missing = diff_trees(&going, &staying);
    assert!(missing.is_empty());
    assert_eq!(render_text(&missing), "");
}

#[test]
fn test_unmatched_file_is_reported_blank() {
    let going = tempdir().unwrap();
    let staying = tempdir().unwrap();
    write_file(&going.path().join("only-here.txt"), b"hello");
    write_file(&staying.path().join("other.txt"), b"world");

    let going = index_tree(going.path());
    let staying = [index_tree(staying.path())];

    let missing = diff_trees(&going, &staying);
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].candidate, Match::None);
    assert_eq!(render_text(&missing), "  only-here.txt\n");
}

#[test]
fn test_changed_file_at_same_path_is_exact_match() {
    let going = tempdir().unwrap();
    let staying = tempdir().unwrap();
    write_file(&going.path().join("docs/report.txt"), b"v2");
    write_file(&staying.path().join("docs/report.txt"), b"v1");

    let going = index_tree(going.path());
    let staying_index = index_tree(staying.path());

    let missing = diff_trees(&going, &[staying_index]);
    assert_eq!(missing.len(), 1);
    assert_eq!(
        missing[0].candidate,
        Match::Exact {
            tree: staying.path().to_path_buf(),
            path: Path::new("docs/report.txt").to_path_buf(),
        }
    );
    assert_eq!(render_text(&missing), "x docs/report.txt\n");
}

#[test]
fn test_moved_and_changed_file_is_similar_match() {
    let going = tempdir().unwrap();
    let staying = tempdir().unwrap();
    write_file(&going.path().join("new/report.txt"), b"v2");
    write_file(&staying.path().join("old/report.txt"), b"v1");

    let going = index_tree(going.path());
    let staying_index = index_tree(staying.path());

    let missing = diff_trees(&going, &[staying_index]);
    assert_eq!(missing.len(), 1);
    assert_eq!(
        missing[0].candidate,
        Match::Similar {
            tree: staying.path().to_path_buf(),
            paths: vec![Path::new("old/report.txt").to_path_buf()],
        }
    );
    assert_eq!(render_text(&missing), "- new/report.txt\n");
}

#[test]
fn test_exact_match_wins_over_basename_match() {
    let going = tempdir().unwrap();
    let staying = tempdir().unwrap();
    write_file(&going.path().join("a/report.txt"), b"v3");
    write_file(&staying.path().join("a/report.txt"), b"v1");
    write_file(&staying.path().join("b/report.txt"), b"v2");

    let going = index_tree(going.path());
    let missing = diff_trees(&going, &[index_tree(staying.path())]);
    assert!(matches!(missing[0].candidate, Match::Exact { .. }));
}

#[test]
fn test_multiple_staying_trees_any_match_suffices() {
    let going = tempdir().unwrap();
    let first = tempdir().unwrap();
    let second = tempdir().unwrap();
    write_file(&going.path().join("a.txt"), b"alpha");
    write_file(&going.path().join("b.txt"), b"beta");
    write_file(&first.path().join("x.txt"), b"alpha");
    write_file(&second.path().join("y.txt"), b"beta");

    let going = index_tree(going.path());
    let staying = [index_tree(first.path()), index_tree(second.path())];
    assert!(diff_trees(&going, &staying).is_empty());
}

#[test]
fn test_report_follows_scan_order() {
    let going = tempdir().unwrap();
    let staying = tempdir().unwrap();
    write_file(&going.path().join("z.txt"), b"one");
    write_file(&going.path().join("a/deep.txt"), b"two");
    write_file(&going.path().join("b.txt"), b"three");
    write_file(&staying.path().join("unrelated.txt"), b"other");

    let going = index_tree(going.path());
    let missing = diff_trees(&going, &[index_tree(staying.path())]);

    // Direct children come before nested paths.
    assert_eq!(render_text(&missing), "  b.txt\n  z.txt\n  a/deep.txt\n");
}

#[test]
fn test_ignored_files_are_invisible_to_the_diff() {
    let going = tempdir().unwrap();
    let staying = tempdir().unwrap();
    write_file(&going.path().join("keep.txt"), b"kept");
    write_file(&going.path().join("build/out.bin"), b"artifact");
    write_file(&going.path().join("scratch.tmp"), b"scratch");
    write_file(&staying.path().join("other.txt"), b"other");

    let ignore = GlobIgnore::new(going.path(), &["build/".into(), "*.tmp".into()]);
    let cache = FingerprintCache::in_memory().unwrap();
    let mut going = Walker::new(going.path(), &ignore)
        .scan(&NullProgress)
        .unwrap();
    digest_tree(&mut going, &cache, &NullProgress, None).unwrap();
    build_index(&mut going);

    let missing = diff_trees(&going, &[index_tree(staying.path())]);
    assert_eq!(render_text(&missing), "  keep.txt\n");
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_is_reported_with_error_indicator() {
    use std::os::unix::fs::PermissionsExt;

    let going = tempdir().unwrap();
    let staying = tempdir().unwrap();
    write_file(&going.path().join("locked.txt"), b"secret");
    write_file(&staying.path().join("locked.txt"), b"secret");
    fs::set_permissions(
        going.path().join("locked.txt"),
        fs::Permissions::from_mode(0o000),
    )
    .unwrap();

    // Root reads through mode 000; nothing to observe then.
    if File::open(going.path().join("locked.txt")).is_ok() {
        return;
    }

    let going_index = index_tree(going.path());
    let missing = diff_trees(&going_index, &[index_tree(staying.path())]);

    // Unknown content is never assumed backed up, even when a copy
    // exists at the same relative path.
    assert_eq!(missing.len(), 1);
    assert!(missing[0].errored);
    assert_eq!(render_text(&missing), "! locked.txt\n");

    fs::set_permissions(
        going.path().join("locked.txt"),
        fs::Permissions::from_mode(0o644),
    )
    .unwrap();
}

#[test]
fn test_json_report_shape() {
    let going = tempdir().unwrap();
    let staying = tempdir().unwrap();
    write_file(&going.path().join("a.txt"), b"gone");
    write_file(&staying.path().join("a.txt"), b"kept");

    let going = index_tree(going.path());
    let staying = [index_tree(staying.path())];
    let missing = diff_trees(&going, &staying);

    let rendered = render_json(&going, &staying, &missing).unwrap();
    let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
    assert_eq!(value["going"], going.root.display().to_string());
    assert_eq!(value["missing"][0]["rel_path"], "a.txt");
    assert_eq!(value["missing"][0]["candidate"]["kind"], "exact");
    assert_eq!(value["missing"][0]["errored"], false);
}

#[test]
fn test_duplicate_listing_groups_by_content() {
    let tree = tempdir().unwrap();
    write_file(&tree.path().join("a.txt"), b"same");
    write_file(&tree.path().join("b.txt"), b"same");
    write_file(&tree.path().join("c.txt"), b"different");

    let index = index_tree(tree.path());
    assert_eq!(index.duplicate_digests.len(), 1);

    let listing = render_duplicates(&index);
    assert!(listing.contains("\ta.txt\n"));
    assert!(listing.contains("\tb.txt\n"));
    assert!(!listing.contains("c.txt"));
}
