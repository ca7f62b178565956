//! Progress reporting utilities using indicatif.
//!
//! The engine emits one [`ProgressEvent`] per discovered file and per
//! completed digest. Events are advisory: consumers may drop or
//! coalesce them freely, and the engine assumes nothing about how fast
//! they are drained.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// One advisory progress update.
#[derive(Debug, Clone, Copy)]
pub struct ProgressEvent<'a> {
    /// Files handled so far in the current phase.
    pub files_seen: usize,
    /// Best-known total. During a scan the total is unknown, so this
    /// trails `files_seen` by one; during digestion it is exact.
    pub estimated_total: usize,
    /// The path currently being processed, relative to its root.
    pub current_path: &'a Path,
}

/// Receiver for engine progress events.
pub trait ProgressCallback: Send + Sync {
    /// A file was discovered during a tree walk.
    fn on_file_discovered(&self, event: &ProgressEvent) {
        let _ = event;
    }

    /// A file finished the digest pipeline (hit, hash, or error).
    fn on_file_digested(&self, event: &ProgressEvent) {
        let _ = event;
    }

    /// A phase ("scan" or "digest") started for one tree.
    fn on_phase_start(&self, phase: &str, total: usize) {
        let _ = (phase, total);
    }

    /// The phase for one tree completed.
    fn on_phase_end(&self, phase: &str) {
        let _ = phase;
    }
}

/// Callback that drops every event. Used by tests and library callers
/// that do their own reporting.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgress;

impl ProgressCallback for NullProgress {}

/// Terminal progress display.
///
/// A spinner with a running counter during the scan phase (total
/// unknown), a bar during the digest phase.
pub struct Progress {
    multi: MultiProgress,
    scan: Mutex<Option<ProgressBar>>,
    digest: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl Progress {
    /// Create a progress display. With `quiet` nothing is drawn.
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            multi: MultiProgress::new(),
            scan: Mutex::new(None),
            digest: Mutex::new(None),
            quiet,
        }
    }

    fn scan_bar(&self) -> ProgressBar {
        let bar = self.multi.add(ProgressBar::new_spinner());
        bar.set_style(
            ProgressStyle::with_template("{spinner} listing {pos} files {wide_msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(Duration::from_millis(100));
        bar
    }

    fn digest_bar(&self, total: usize) -> ProgressBar {
        let bar = self.multi.add(ProgressBar::new(total as u64));
        bar.set_style(
            ProgressStyle::with_template(
                "[{elapsed_precise}] {bar:30} {pos}/{len} hashed {wide_msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar
    }
}

impl ProgressCallback for Progress {
    fn on_file_discovered(&self, event: &ProgressEvent) {
        if self.quiet {
            return;
        }
        let guard = self.scan.lock().unwrap();
        if let Some(bar) = guard.as_ref() {
            bar.set_position(event.files_seen as u64);
            bar.set_message(event.current_path.display().to_string());
        }
    }

    fn on_file_digested(&self, event: &ProgressEvent) {
        if self.quiet {
            return;
        }
        let guard = self.digest.lock().unwrap();
        if let Some(bar) = guard.as_ref() {
            bar.set_position(event.files_seen as u64);
            bar.set_message(event.current_path.display().to_string());
        }
    }

    fn on_phase_start(&self, phase: &str, total: usize) {
        if self.quiet {
            return;
        }
        match phase {
            "scan" => {
                *self.scan.lock().unwrap() = Some(self.scan_bar());
            }
            "digest" => {
                *self.digest.lock().unwrap() = Some(self.digest_bar(total));
            }
            _ => {}
        }
    }

    fn on_phase_end(&self, phase: &str) {
        if self.quiet {
            return;
        }
        let bar = match phase {
            "scan" => self.scan.lock().unwrap().take(),
            "digest" => self.digest.lock().unwrap().take(),
            _ => None,
        };
        if let Some(bar) = bar {
            bar.finish_and_clear();
        }
    }
}
