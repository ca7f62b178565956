//! Command-line interface definitions.
//!
//! # Example
//!
//! ```bash
//! # Which files on the external drive are not backed up on the NAS?
//! backscan /mnt/external /mnt/nas/backup /mnt/nas/archive
//!
//! # Same, writing the report to a file (previous report kept as report.txt~)
//! backscan /mnt/external /mnt/nas/backup -o report.txt
//!
//! # List in-tree duplicate groups as well
//! backscan /mnt/external /mnt/nas/backup --duplicates
//!
//! # Carry the fingerprint cache to another machine
//! backscan /mnt/external /mnt/nas/backup --cache-snapshot fingerprints.json
//! ```

use clap::Parser;
use std::path::PathBuf;

/// Backup completeness checker.
///
/// Fingerprints every file in the given trees with SHA-512 (cached
/// between runs) and reports each file of the first tree whose content
/// exists in none of the remaining trees.
#[derive(Debug, Parser)]
#[command(name = "backscan")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Trees to compare: the first is the "going" tree being checked,
    /// the rest are "staying" reference trees
    #[arg(value_name = "TREE", required = true)]
    pub trees: Vec<PathBuf>,

    /// Glob pattern to ignore, gitignore syntax (repeatable)
    #[arg(short = 'i', long = "ignore", value_name = "PATTERN")]
    pub ignore_patterns: Vec<String>,

    /// Write the report to a file instead of stdout; an existing file
    /// is kept as FILE~
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Emit the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Also list duplicate groups found within each tree
    #[arg(long)]
    pub duplicates: bool,

    /// Path to the fingerprint cache database
    #[arg(long, value_name = "FILE", env = "BACKSCAN_CACHE_DB")]
    pub cache_db: Option<PathBuf>,

    /// Do not persist fingerprints; use an in-memory cache for this run
    #[arg(long, conflicts_with = "cache_db")]
    pub no_cache: bool,

    /// Portable cache snapshot to load before the run and rewrite after
    #[arg(long, value_name = "FILE")]
    pub cache_snapshot: Option<PathBuf>,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress display and all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Report fatal errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,
}
