use backscan::cli::Cli;
use backscan::error::ExitCode;
use backscan::run_app;
use clap::Parser;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tempfile::tempdir;

fn write_file(path: &Path, content: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    File::create(path).unwrap().write_all(content).unwrap();
}

fn run(args: &[&str]) -> ExitCode {
    let mut full = vec!["backscan", "--quiet", "--no-cache"];
    full.extend_from_slice(args);
    run_app(Cli::parse_from(full)).unwrap()
}

#[test]
fn test_fully_backed_up_trees_exit_all_backed_up() {
    let going = tempdir().unwrap();
    let staying = tempdir().unwrap();
    write_file(&going.path().join("a.txt"), b"same");
    write_file(&staying.path().join("renamed.txt"), b"same");

    let code = run(&[
        going.path().to_str().unwrap(),
        staying.path().to_str().unwrap(),
    ]);
    assert_eq!(code, ExitCode::AllBackedUp);
}

#[test]
fn test_missing_files_exit_success_and_write_report() {
    let going = tempdir().unwrap();
    let staying = tempdir().unwrap();
    let out = tempdir().unwrap();
    let report = out.path().join("report.txt");
    write_file(&going.path().join("only.txt"), b"unique");
    write_file(&staying.path().join("other.txt"), b"different");

    let code = run(&[
        going.path().to_str().unwrap(),
        staying.path().to_str().unwrap(),
        "--output",
        report.to_str().unwrap(),
    ]);
    assert_eq!(code, ExitCode::Success);
    assert_eq!(fs::read_to_string(&report).unwrap(), "  only.txt\n");
}

#[test]
fn test_rerun_backs_up_previous_report() {
    let going = tempdir().unwrap();
    let staying = tempdir().unwrap();
    let out = tempdir().unwrap();
    let report = out.path().join("nested/dir/report.txt");
    write_file(&going.path().join("only.txt"), b"unique");
    write_file(&staying.path().join("other.txt"), b"different");

    let args = [
        going.path().to_str().unwrap().to_string(),
        staying.path().to_str().unwrap().to_string(),
        "--output".to_string(),
        report.to_str().unwrap().to_string(),
    ];
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    // First run creates the parent directories.
    run(&args);
    assert!(report.exists());
    assert!(!report.with_file_name("report.txt~").exists());

    // Second run moves the first report aside.
    run(&args);
    assert_eq!(
        fs::read_to_string(report.with_file_name("report.txt~")).unwrap(),
        "  only.txt\n"
    );
}

#[test]
fn test_invalid_root_is_a_fatal_error() {
    let staying = tempdir().unwrap();
    let cli = Cli::parse_from([
        "backscan",
        "--quiet",
        "--no-cache",
        "/definitely/does/not/exist",
        staying.path().to_str().unwrap(),
    ]);
    assert!(run_app(cli).is_err());
}

#[test]
fn test_ignore_flag_excludes_files_from_the_diff() {
    let going = tempdir().unwrap();
    let staying = tempdir().unwrap();
    let out = tempdir().unwrap();
    let report = out.path().join("report.txt");
    write_file(&going.path().join("kept.txt"), b"kept");
    write_file(&going.path().join("junk.log"), b"junk");
    write_file(&staying.path().join("other.txt"), b"different");

    let code = run(&[
        going.path().to_str().unwrap(),
        staying.path().to_str().unwrap(),
        "--ignore",
        "*.log",
        "--output",
        report.to_str().unwrap(),
    ]);
    assert_eq!(code, ExitCode::Success);
    assert_eq!(fs::read_to_string(&report).unwrap(), "  kept.txt\n");
}

#[test]
fn test_cache_snapshot_is_written_and_reloaded() {
    let going = tempdir().unwrap();
    let staying = tempdir().unwrap();
    let out = tempdir().unwrap();
    let snapshot = out.path().join("snapshot.json");
    write_file(&going.path().join("a.txt"), b"same");
    write_file(&staying.path().join("a.txt"), b"same");

    let args = [
        going.path().to_str().unwrap().to_string(),
        staying.path().to_str().unwrap().to_string(),
        "--cache-snapshot".to_string(),
        snapshot.to_str().unwrap().to_string(),
    ];
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    assert_eq!(run(&args), ExitCode::AllBackedUp);
    let text = fs::read_to_string(&snapshot).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["version"], 1);
    assert_eq!(value["files"].as_array().unwrap().len(), 2);

    // The second run accepts its own snapshot and rewrites it, moving
    // the first one aside.
    assert_eq!(run(&args), ExitCode::AllBackedUp);
    assert!(snapshot.with_file_name("snapshot.json~").exists());
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_exits_partial_success() {
    use std::os::unix::fs::PermissionsExt;

    let going = tempdir().unwrap();
    let staying = tempdir().unwrap();
    write_file(&going.path().join("locked.txt"), b"secret");
    write_file(&staying.path().join("other.txt"), b"different");
    fs::set_permissions(
        going.path().join("locked.txt"),
        fs::Permissions::from_mode(0o000),
    )
    .unwrap();

    // Root reads through mode 000; nothing to observe then.
    if File::open(going.path().join("locked.txt")).is_ok() {
        return;
    }

    let code = run(&[
        going.path().to_str().unwrap(),
        staying.path().to_str().unwrap(),
    ]);
    assert_eq!(code, ExitCode::PartialSuccess);

    fs::set_permissions(
        going.path().join("locked.txt"),
        fs::Permissions::from_mode(0o644),
    )
    .unwrap();
}
