//! backscan - Backup Completeness Checker
//!
//! Inventories directory trees, computes a SHA-512 fingerprint for
//! every file (cached across runs in SQLite), detects duplicate files
//! within each tree, and reports which files of a "going" tree have no
//! content-equivalent anywhere in a set of "staying" reference trees.

pub mod cache;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod scanner;
pub mod signal;

use anyhow::{Context, Result};

use crate::cache::{CacheError, FingerprintCache};
use crate::cli::Cli;
use crate::config::Config;
use crate::error::ExitCode;
use crate::progress::Progress;
use crate::scanner::{DirectoryIndex, GlobIgnore, ScanError, Walker};

/// Run the full scan / digest / index / diff pipeline for a parsed
/// command line. Returns the process exit code; fatal errors propagate
/// to the caller.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    let shutdown = match signal::install_handler() {
        Ok(handler) => handler,
        Err(e) => {
            log::warn!("Could not install Ctrl+C handler: {}", e);
            signal::ShutdownHandler::new()
        }
    };

    let config = Config::load();
    let mut patterns = config.ignore_patterns.clone();
    patterns.extend(cli.ignore_patterns.iter().cloned());

    let cache = open_cache(&cli, &config)?;

    if let Some(snapshot_path) = &cli.cache_snapshot {
        load_snapshot(&cache, snapshot_path);
    }

    let progress = Progress::new(cli.quiet);

    // Scan every root before reporting invalid ones, so one bad
    // argument does not hide another.
    let mut indexes: Vec<DirectoryIndex> = Vec::new();
    let mut invalid_roots = Vec::new();
    for root in &cli.trees {
        let predicate = GlobIgnore::new(root, &patterns);
        let walker = Walker::new(root, &predicate).with_shutdown_flag(shutdown.flag());
        match walker.scan(&progress) {
            Ok(index) => indexes.push(index),
            Err(ScanError::Interrupted) => {
                cache.close().ok();
                return Ok(ExitCode::Interrupted);
            }
            Err(e @ ScanError::InvalidRoot { .. }) => invalid_roots.push(e),
        }
    }
    if !invalid_roots.is_empty() {
        for e in &invalid_roots {
            log::error!("{e}");
        }
        cache.close().ok();
        anyhow::bail!(
            "{} of {} scan roots were invalid",
            invalid_roots.len(),
            cli.trees.len()
        );
    }

    for index in &mut indexes {
        match pipeline::digest_tree(index, &cache, &progress, Some(&shutdown.flag())) {
            Ok(stats) => log::info!(
                "{}: {} files ({} from cache, {} hashed, {} unreadable)",
                index.root.display(),
                stats.total,
                stats.cache_hits,
                stats.hashed,
                stats.failed
            ),
            Err(ScanError::Interrupted) => {
                // A partially digested pass is discarded, never indexed.
                cache.close().ok();
                return Ok(ExitCode::Interrupted);
            }
            Err(e) => {
                cache.close().ok();
                return Err(e.into());
            }
        }
    }

    for index in &mut indexes {
        duplicates::build_index(index);
    }

    if cli.duplicates {
        for index in &indexes {
            print!("{}", output::render_duplicates(index));
        }
    }

    let Some((going, staying)) = indexes.split_first() else {
        cache.close().ok();
        anyhow::bail!("no trees were scanned");
    };
    let missing = duplicates::diff_trees(going, staying);

    let report = if cli.json {
        output::render_json(going, staying, &missing).context("Failed to serialize report")?
    } else {
        output::render_text(&missing)
    };

    match &cli.output {
        Some(path) => {
            let backed_up = output::write_with_backup(path, &report)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            if backed_up {
                log::info!(
                    "Report written to {}; previous report moved to backup",
                    path.display()
                );
            } else {
                log::info!("Report written to {}", path.display());
            }
        }
        None => print!("{report}"),
    }

    if let Some(snapshot_path) = &cli.cache_snapshot {
        match cache.dump_snapshot() {
            Ok(text) => {
                if let Err(e) = output::write_with_backup(snapshot_path, &text) {
                    log::warn!(
                        "Failed to write cache snapshot to {}: {}",
                        snapshot_path.display(),
                        e
                    );
                }
            }
            Err(e) => log::warn!("Failed to serialize cache snapshot: {}", e),
        }
    }

    cache.close().context("Failed to close fingerprint cache")?;

    let had_file_errors = indexes.iter().any(|index| !index.errored.is_empty());
    Ok(if had_file_errors {
        ExitCode::PartialSuccess
    } else if missing.is_empty() {
        ExitCode::AllBackedUp
    } else {
        ExitCode::Success
    })
}

fn open_cache(cli: &Cli, config: &Config) -> Result<FingerprintCache> {
    if cli.no_cache {
        return Ok(FingerprintCache::in_memory()?);
    }

    let db_path = match cli.cache_db.clone().or_else(|| config.cache_db.clone()) {
        Some(path) => path,
        None => Config::default_cache_db()?,
    };
    Ok(FingerprintCache::open_or_memory(&db_path)?)
}

fn load_snapshot(cache: &FingerprintCache, path: &std::path::Path) {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            // Missing or unreadable snapshot is non-fatal; the run
            // starts from whatever the database already holds.
            log::info!("No readable cache snapshot at {}: {}", path.display(), e);
            return;
        }
    };

    match cache.load_snapshot(&text) {
        Ok(()) => {}
        Err(e @ CacheError::VersionMismatch { .. }) => {
            log::warn!("Ignoring cache snapshot {}: {}", path.display(), e);
        }
        Err(e) => {
            log::warn!("Failed to load cache snapshot {}: {}", path.display(), e);
        }
    }
}
