//! Structured error handling and exit codes.

use serde::Serialize;

/// Exit codes for the backscan binary.
///
/// - 0: Completed; some files are not backed up (the report matters)
/// - 1: General error (unexpected failure)
/// - 2: Completed; every going-tree file has a content match
/// - 3: Completed, but some files could not be read or hashed
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Run completed and missing files were reported.
    Success = 0,
    /// An unexpected error occurred.
    GeneralError = 1,
    /// Run completed; nothing is missing from the staying trees.
    AllBackedUp = 2,
    /// Run completed with non-fatal per-file errors; unreadable files
    /// are reported as not backed up.
    PartialSuccess = 3,
    /// Run was interrupted by the user.
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "BK000",
            Self::GeneralError => "BK001",
            Self::AllBackedUp => "BK002",
            Self::PartialSuccess => "BK003",
            Self::Interrupted => "BK130",
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "BK001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
    /// Whether the run was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: err.to_string(),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
