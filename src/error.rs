//! Structured error handling and exit codes.

use serde::Serialize;

use crate::actions::DispositionError;
use crate::config::ConfigError;
use crate::duplicates::FinderError;

/// Exit codes for the dupefind application.
///
/// - 0: Success (duplicates found, or a non-scan command completed)
/// - 1: General error (unexpected failure)
/// - 2: No duplicates found
/// - 3: Invalid input (root path missing or not a directory, bad config)
/// - 4: Conflicting disposition flags
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Scan completed and duplicates were found.
    Success = 0,
    /// An unexpected error occurred.
    GeneralError = 1,
    /// Scan completed but no duplicates were found.
    NoDuplicates = 2,
    /// The input path or configuration was rejected before any work.
    InvalidInput = 3,
    /// `--interactive` and `--auto` were given together.
    ConflictingPolicy = 4,
    /// The run was interrupted by the user.
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
            Self::Success => "DF000",
            Self::GeneralError => "DF001",
            Self::NoDuplicates => "DF002",
            Self::InvalidInput => "DF003",
            Self::ConflictingPolicy => "DF004",
            Self::Interrupted => "DF130",
        }
    }

    /// Map an application error to its exit code.
    ///
    /// Looks through the whole `anyhow` chain, so context layers added with
    /// `.context(...)` do not hide the underlying cause.
    #[must_use]
    pub fn from_error(err: &anyhow::Error) -> Self {
        for cause in err.chain() {
            if let Some(e) = cause.downcast_ref::<FinderError>() {
                return match e {
                    FinderError::Interrupted => Self::Interrupted,
                    FinderError::PathNotFound(_) | FinderError::NotADirectory(_) => {
                        Self::InvalidInput
                    }
                    FinderError::IoWithPath { .. } => Self::GeneralError,
                };
            }
            if let Some(e) = cause.downcast_ref::<DispositionError>() {
                return match e {
                    DispositionError::ConflictingPolicy => Self::ConflictingPolicy,
                    DispositionError::MissingSelectionSource => Self::GeneralError,
                };
            }
            if cause.downcast_ref::<ConfigError>().is_some() {
                return Self::InvalidInput;
            }
        }
        Self::GeneralError
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "DF001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including context
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{:#}", err),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
