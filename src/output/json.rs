//! JSON output formatter for duplicate scan results.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "algorithm": "blake3",
//!   "verified": false,
//!   "groups": [
//!     {
//!       "digest": "abc123...",
//!       "algorithm": "blake3",
//!       "size": 1024,
//!       "files": [{ "path": "/a.txt", "size": 1024 }, { "path": "/b.txt", "size": 1024 }]
//!     }
//!   ],
//!   "summary": {
//!     "total_files": 100,
//!     "unique_files": 90,
//!     "excluded_files": 0,
//!     "duplicate_groups": 5,
//!     "duplicate_files": 5,
//!     "reclaimable_space": 51200,
//!     "scan_duration_ms": 1234
//!   },
//!   "diagnostics": [{ "kind": "unreadable_file", "path": "/x", "reason": "..." }]
//! }
//! ```

use std::io::Write;
use std::path::Path;

use serde::Serialize;

use super::OutputError;
use crate::duplicates::{Diagnostic, DuplicateGroup, DuplicateSet, ScanSummary};
use crate::scanner::DigestAlgorithm;

/// A single file inside a JSON group.
#[derive(Debug, Clone, Serialize)]
pub struct JsonFile {
    /// Path as scanned
    pub path: String,
    /// Size in bytes
    pub size: u64,
}

/// A single duplicate group in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDuplicateGroup {
    /// Content digest as hexadecimal
    pub digest: String,
    /// Algorithm that produced `digest`
    pub algorithm: DigestAlgorithm,
    /// File size in bytes
    pub size: u64,
    /// Group members, retained copy first
    pub files: Vec<JsonFile>,
}

impl JsonDuplicateGroup {
    /// Convert a [`DuplicateGroup`].
    #[must_use]
    pub fn from_duplicate_group(group: &DuplicateGroup) -> Self {
        Self {
            digest: group.digest_hex(),
            algorithm: group.digest.algorithm(),
            size: group.size,
            files: group
                .files
                .iter()
                .map(|f| JsonFile {
                    path: path_string(&f.path),
                    size: f.size,
                })
                .collect(),
        }
    }
}

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Files offered to the engine
    pub total_files: usize,
    /// Total size of those files in bytes
    pub total_size: u64,
    /// Files skipped by the minimum size filter
    pub below_min_size: usize,
    /// Files identified as having no duplicate
    pub unique_files: usize,
    /// Files excluded because of an error
    pub excluded_files: usize,
    /// Number of confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Redundant copies across all groups
    pub duplicate_files: usize,
    /// Bytes reclaimable by keeping one copy per group
    pub reclaimable_space: u64,
    /// Group members rejected by byte comparison
    pub collisions_rejected: usize,
    /// Bytes read while digesting
    pub bytes_hashed: u64,
    /// Duration of the scan in milliseconds
    pub scan_duration_ms: u64,
}

impl JsonSummary {
    /// Create a JSON summary from a [`ScanSummary`].
    #[must_use]
    pub fn from_scan_summary(summary: &ScanSummary) -> Self {
        Self {
            total_files: summary.total_files,
            total_size: summary.total_size,
            below_min_size: summary.below_min_size,
            unique_files: summary.unique_files,
            excluded_files: summary.excluded_files,
            duplicate_groups: summary.duplicate_groups,
            duplicate_files: summary.duplicate_files,
            reclaimable_space: summary.reclaimable_space,
            collisions_rejected: summary.collisions_rejected,
            bytes_hashed: summary.bytes_hashed,
            scan_duration_ms: summary.scan_duration.as_millis() as u64,
        }
    }
}

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// Digest algorithm used for the scan
    pub algorithm: DigestAlgorithm,
    /// Whether groups were confirmed byte-for-byte
    pub verified: bool,
    /// Duplicate groups in discovery order
    pub groups: Vec<JsonDuplicateGroup>,
    /// Scan summary statistics
    pub summary: JsonSummary,
    /// Non-fatal problems encountered during the scan
    pub diagnostics: Vec<Diagnostic>,
}

impl JsonOutput {
    /// Create JSON output from a duplicate set and its summary.
    ///
    /// # Example
    ///
    /// ```
    /// use dupefind::duplicates::{DuplicateSet, ScanSummary};
    /// use dupefind::output::json::JsonOutput;
    /// use dupefind::scanner::DigestAlgorithm;
    ///
    /// let set = DuplicateSet::new(DigestAlgorithm::Sha1);
    /// let output = JsonOutput::new(&set, &ScanSummary::default());
    /// assert!(output.groups.is_empty());
    /// ```
    #[must_use]
    pub fn new(set: &DuplicateSet, summary: &ScanSummary) -> Self {
        Self {
            algorithm: set.algorithm,
            verified: set.verified,
            groups: set
                .groups
                .iter()
                .map(JsonDuplicateGroup::from_duplicate_group)
                .collect(),
            summary: JsonSummary::from_scan_summary(summary),
            diagnostics: set.diagnostics.clone(),
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write pretty-printed JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<(), OutputError> {
        serde_json::to_writer_pretty(&mut writer, self)?;
        writeln!(writer)?;
        Ok(())
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{digest_bytes, FileEntry};
    use std::path::PathBuf;
    use std::time::{Duration, SystemTime};

    fn sample_set() -> DuplicateSet {
        let mut set = DuplicateSet::new(DigestAlgorithm::Md5);
        set.groups.push(DuplicateGroup::new(
            digest_bytes(DigestAlgorithm::Md5, b"hello"),
            5,
            vec![
                FileEntry::new(PathBuf::from("/a/one.txt"), 5, SystemTime::UNIX_EPOCH),
                FileEntry::new(PathBuf::from("/b/two.txt"), 5, SystemTime::UNIX_EPOCH),
            ],
        ));
        set.diagnostics.push(Diagnostic::UnreadableFile {
            path: PathBuf::from("/locked"),
            reason: "permission denied".to_string(),
        });
        set
    }

    #[test]
    fn test_json_group_shape() {
        let set = sample_set();
        let output = JsonOutput::new(&set, &ScanSummary::default());
        let value: serde_json::Value = serde_json::from_str(&output.to_json().unwrap()).unwrap();

        let group = &value["groups"][0];
        assert_eq!(group["digest"], "5d41402abc4b2a76b9719d911017c592");
        assert_eq!(group["algorithm"], "md5");
        assert_eq!(group["size"], 5);
        assert_eq!(group["files"][0]["path"], "/a/one.txt");
        assert_eq!(group["files"][1]["size"], 5);
    }

    #[test]
    fn test_json_includes_diagnostics() {
        let set = sample_set();
        let output = JsonOutput::new(&set, &ScanSummary::default());
        let value: serde_json::Value = serde_json::from_str(&output.to_json().unwrap()).unwrap();

        assert_eq!(value["diagnostics"][0]["kind"], "unreadable_file");
        assert_eq!(value["diagnostics"][0]["path"], "/locked");
    }

    #[test]
    fn test_json_summary_fields() {
        let summary = ScanSummary {
            total_files: 10,
            unique_files: 7,
            excluded_files: 1,
            duplicate_groups: 1,
            duplicate_files: 1,
            reclaimable_space: 5,
            scan_duration: Duration::from_millis(1500),
            ..Default::default()
        };
        let output = JsonOutput::new(&sample_set(), &summary);

        assert_eq!(output.summary.scan_duration_ms, 1500);
        assert_eq!(output.summary.unique_files, 7);
        assert_eq!(output.summary.excluded_files, 1);
    }

    #[test]
    fn test_json_summary_only_reports_completed_scans() {
        // Interrupted scans are errors, so the summary carries no flag for them.
        let output = JsonOutput::new(&sample_set(), &ScanSummary::default());
        let value: serde_json::Value = serde_json::from_str(&output.to_json().unwrap()).unwrap();

        assert!(value["summary"].get("interrupted").is_none());
        assert!(value["summary"].get("unique_files").is_some());
    }

    #[test]
    fn test_json_pretty_write() {
        let output = JsonOutput::new(&sample_set(), &ScanSummary::default());
        let mut buffer = Vec::new();
        output.write_to(&mut buffer).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains('\n'));
        assert!(text.ends_with("}\n"));
    }
}
