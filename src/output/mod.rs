//! Renderers for duplicate scan results.
//!
//! Every renderer consumes a [`DuplicateSet`] and its [`ScanSummary`]:
//! - [`text`]: colored human-readable listing
//! - [`json`]: one object per group plus summary and diagnostics
//! - [`csv`]: one row per file
//!
//! # Example
//!
//! ```no_run
//! use dupefind::duplicates::DuplicateFinder;
//! use dupefind::output::{render, OutputFormat};
//! use std::path::Path;
//!
//! let (set, summary) = DuplicateFinder::with_defaults()
//!     .find_duplicates(Path::new("."))
//!     .unwrap();
//! render(OutputFormat::Json, &set, &summary, std::io::stdout()).unwrap();
//! ```

pub mod csv;
pub mod json;
pub mod text;

use std::io::{self, Write};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::duplicates::{DuplicateSet, ScanSummary};

pub use self::csv::CsvOutput;
pub use self::json::JsonOutput;
pub use self::text::TextOutput;

/// Output format for scan results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable listing
    #[default]
    Text,
    /// JSON output for scripting
    Json,
    /// CSV output for spreadsheets
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

/// Errors that can occur while rendering output.
#[derive(Debug, Error)]
pub enum OutputError {
    /// I/O error during writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error during JSON serialization.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error during CSV serialization.
    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),
}

/// Render `set` in the given format to `writer`.
///
/// # Errors
///
/// Returns [`OutputError`] if serialization or writing fails.
pub fn render<W: Write>(
    format: OutputFormat,
    set: &DuplicateSet,
    summary: &ScanSummary,
    writer: W,
) -> Result<(), OutputError> {
    match format {
        OutputFormat::Text => TextOutput::new(set, summary).write_to(writer),
        OutputFormat::Json => JsonOutput::new(set, summary).write_to(writer),
        OutputFormat::Csv => CsvOutput::new(set).write_to(writer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::DigestAlgorithm;

    #[test]
    fn test_output_format_display() {
        assert_eq!(OutputFormat::Text.to_string(), "text");
        assert_eq!(OutputFormat::Json.to_string(), "json");
        assert_eq!(OutputFormat::Csv.to_string(), "csv");
    }

    #[test]
    fn test_render_empty_set_in_every_format() {
        let set = DuplicateSet::new(DigestAlgorithm::Blake3);
        let summary = ScanSummary::default();

        for format in [OutputFormat::Text, OutputFormat::Json, OutputFormat::Csv] {
            let mut buffer = Vec::new();
            render(format, &set, &summary, &mut buffer).unwrap();
            if format != OutputFormat::Csv {
                assert!(!buffer.is_empty(), "{format} produced no output");
            }
        }
    }
}
