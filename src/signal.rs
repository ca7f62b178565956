//! Signal handling for graceful shutdown.
//!
//! Centralized Ctrl+C handling: an `AtomicBool` flag shared with the
//! walker and the digest pipeline, which check it between entries and
//! between files. An interrupted pass is discarded wholesale; the
//! process exits with code 130 (128 + SIGINT).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shutdown flag wrapper shared across the engine phases.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// Create a handler with the flag initially unset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether shutdown has been requested.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Request shutdown. Used by the signal handler and by tests.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// The underlying flag, for passing to walkers and pipelines.
    #[must_use]
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }
}

/// Install a Ctrl+C handler and return the shared shutdown handler.
///
/// The handler only sets the flag; cleanup happens on the main path
/// once the current file completes.
pub fn install_handler() -> Result<ShutdownHandler, ctrlc::Error> {
    let handler = ShutdownHandler::new();
    let flag = handler.flag();
    ctrlc::set_handler(move || {
        eprintln!("Interrupted. Finishing current file and cleaning up...");
        flag.store(true, Ordering::SeqCst);
    })?;
    Ok(handler)
}
