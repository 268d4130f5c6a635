//! Duplicate set model and size-based file organization.
//!
//! # Overview
//!
//! Records flow through three shapes during a run, each owning the records
//! it was handed:
//!
//! 1. [`SizeGroup`]: files sharing an exact byte size (Phase 1)
//! 2. [`DigestGroup`]: files sharing size and content digest (Phase 2)
//! 3. [`DuplicateGroup`]: confirmed duplicates, collected in a [`DuplicateSet`]
//!
//! Every record carries its discovery index, so each stage can restore the
//! input order no matter how the previous stage was scheduled.
//!
//! # Example
//!
//! ```
//! use dupefind::scanner::FileEntry;
//! use dupefind::duplicates::group_by_size;
//! use std::path::PathBuf;
//! use std::time::SystemTime;
//!
//! let files = vec![
//!     FileEntry::new(PathBuf::from("/file1.txt"), 1024, SystemTime::now()),
//!     FileEntry::new(PathBuf::from("/file2.txt"), 1024, SystemTime::now()),
//!     FileEntry::new(PathBuf::from("/file3.txt"), 2048, SystemTime::now()),
//! ];
//!
//! // Only buckets with 2+ files are potential duplicates
//! let (groups, stats) = group_by_size(files, 0);
//!
//! assert_eq!(stats.total_files, 3);
//! assert_eq!(stats.potential_duplicates, 2);
//! assert_eq!(groups.len(), 1);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::Serialize;

use crate::scanner::{Digest, DigestAlgorithm, DigestError, FileEntry, ScanError};

/// A discovered file as tracked by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Path as discovered
    pub path: PathBuf,
    /// Size in bytes at discovery time
    pub size: u64,
    /// Modification time at discovery time
    pub modified: SystemTime,
    /// Position in the input stream
    pub order: usize,
    /// Content digest, filled only for members of multi-file size buckets
    pub digest: Option<Digest>,
}

impl FileRecord {
    /// Create a record from a discovered file and its discovery index.
    #[must_use]
    pub fn from_entry(entry: FileEntry, order: usize) -> Self {
        Self {
            path: entry.path,
            size: entry.size,
            modified: entry.modified,
            order,
            digest: None,
        }
    }

    /// Convert back into the file entry handed to callers.
    #[must_use]
    pub fn into_entry(self) -> FileEntry {
        FileEntry::new(self.path, self.size, self.modified)
    }
}

/// A group of files with the same size.
#[derive(Debug, Clone)]
pub struct SizeGroup {
    /// File size in bytes (shared by all files in this group)
    pub size: u64,
    /// Files with this exact size, in discovery order
    pub records: Vec<FileRecord>,
}

impl SizeGroup {
    /// Create an empty size group.
    #[must_use]
    pub fn new(size: u64) -> Self {
        Self {
            size,
            records: Vec::new(),
        }
    }

    /// Add a record to this group.
    ///
    /// # Panics
    ///
    /// Debug assertion fails if the record size doesn't match the group size.
    pub fn add(&mut self, record: FileRecord) {
        debug_assert_eq!(
            record.size, self.size,
            "File size {} doesn't match group size {}",
            record.size, self.size
        );
        self.records.push(record);
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Check if this group has potential duplicates (2+ files).
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        self.records.len() > 1
    }

    /// Discovery index of the earliest member.
    #[must_use]
    pub fn first_order(&self) -> usize {
        self.records.first().map_or(usize::MAX, |r| r.order)
    }
}

/// Files sharing both size and content digest.
#[derive(Debug, Clone)]
pub struct DigestGroup {
    /// Shared size in bytes
    pub size: u64,
    /// Shared digest
    pub digest: Digest,
    /// Members in discovery order; each record's digest is set
    pub records: Vec<FileRecord>,
}

impl DigestGroup {
    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Discovery index of the earliest member.
    #[must_use]
    pub fn first_order(&self) -> usize {
        self.records.first().map_or(usize::MAX, |r| r.order)
    }
}

/// Confirmed group of byte-identical files.
///
/// The first member is the earliest discovered and is the copy retained by
/// default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    /// Content digest shared by every member
    pub digest: Digest,
    /// File size in bytes shared by every member
    pub size: u64,
    /// Members (always 2 or more) in discovery order
    pub files: Vec<FileEntry>,
}

impl DuplicateGroup {
    /// Create a new duplicate group.
    #[must_use]
    pub fn new(digest: Digest, size: u64, files: Vec<FileEntry>) -> Self {
        Self {
            digest,
            size,
            files,
        }
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total size of all files in this group.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.size * self.files.len() as u64
    }

    /// Total wasted space (all copies minus one).
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.size * self.duplicate_count() as u64
    }

    /// Number of duplicate copies (total - 1 original).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.files.len().saturating_sub(1)
    }

    /// Digest as hexadecimal string.
    #[must_use]
    pub fn digest_hex(&self) -> String {
        self.digest.to_hex()
    }

    /// Get just the paths of files in this group.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }

    /// The member retained by default (earliest discovered).
    #[must_use]
    pub fn retained(&self) -> Option<&FileEntry> {
        self.files.first()
    }
}

impl From<DigestGroup> for DuplicateGroup {
    fn from(group: DigestGroup) -> Self {
        Self {
            digest: group.digest,
            size: group.size,
            files: group
                .records
                .into_iter()
                .map(FileRecord::into_entry)
                .collect(),
        }
    }
}

/// A non-fatal, per-file problem encountered during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// The file could not be listed or sized during traversal.
    ScanFailed {
        /// Affected path
        path: PathBuf,
        /// Human-readable cause
        reason: String,
    },
    /// The file could not be opened or read.
    UnreadableFile {
        /// Affected path
        path: PathBuf,
        /// Human-readable cause
        reason: String,
    },
    /// The file changed size between discovery and reading.
    TruncatedRead {
        /// Affected path
        path: PathBuf,
        /// Size recorded at discovery
        expected: u64,
        /// Bytes actually read
        actual: u64,
    },
    /// Digests matched but the bytes did not.
    CollisionRejected {
        /// Member removed from the group
        path: PathBuf,
        /// Member it was compared against
        anchor: PathBuf,
    },
}

impl Diagnostic {
    /// Path the diagnostic is about.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::ScanFailed { path, .. }
            | Self::UnreadableFile { path, .. }
            | Self::TruncatedRead { path, .. }
            | Self::CollisionRejected { path, .. } => path,
        }
    }

    /// Whether this diagnostic excluded the file because of an error.
    ///
    /// Collision rejections are not errors: the file was read successfully
    /// and simply turned out to be different.
    #[must_use]
    pub fn is_exclusion(&self) -> bool {
        !matches!(self, Self::CollisionRejected { .. })
    }

    /// Short machine-friendly kind name.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ScanFailed { .. } => "scan_failed",
            Self::UnreadableFile { .. } => "unreadable_file",
            Self::TruncatedRead { .. } => "truncated_read",
            Self::CollisionRejected { .. } => "collision_rejected",
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ScanFailed { path, reason } => {
                write!(f, "scan failed for {}: {}", path.display(), reason)
            }
            Self::UnreadableFile { path, reason } => {
                write!(f, "unreadable file {}: {}", path.display(), reason)
            }
            Self::TruncatedRead {
                path,
                expected,
                actual,
            } => write!(
                f,
                "truncated read for {}: expected {} bytes, read {}",
                path.display(),
                expected,
                actual
            ),
            Self::CollisionRejected { path, anchor } => write!(
                f,
                "digest collision rejected: {} differs from {}",
                path.display(),
                anchor.display()
            ),
        }
    }
}

impl From<&ScanError> for Diagnostic {
    fn from(error: &ScanError) -> Self {
        Self::ScanFailed {
            path: error.path().to_path_buf(),
            reason: error.to_string(),
        }
    }
}

impl From<&DigestError> for Diagnostic {
    fn from(error: &DigestError) -> Self {
        match error {
            DigestError::UnreadableFile { path, source } => Self::UnreadableFile {
                path: path.clone(),
                reason: source.to_string(),
            },
            DigestError::TruncatedRead {
                path,
                expected,
                actual,
            } => Self::TruncatedRead {
                path: path.clone(),
                expected: *expected,
                actual: *actual,
            },
            DigestError::Interrupted(path) => Self::UnreadableFile {
                path: path.clone(),
                reason: "interrupted".to_string(),
            },
        }
    }
}

/// All duplicate groups found in one run, plus per-file diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateSet {
    /// Groups ordered by the discovery order of their first member
    pub groups: Vec<DuplicateGroup>,
    /// Non-fatal problems, in the order they were encountered
    pub diagnostics: Vec<Diagnostic>,
    /// Algorithm used for the digests in this set
    pub algorithm: DigestAlgorithm,
    /// Whether groups were confirmed byte-for-byte
    pub verified: bool,
}

impl DuplicateSet {
    /// Create an empty set for the given algorithm.
    #[must_use]
    pub fn new(algorithm: DigestAlgorithm) -> Self {
        Self {
            groups: Vec::new(),
            diagnostics: Vec::new(),
            algorithm,
            verified: false,
        }
    }

    /// Number of duplicate groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// True when no duplicates were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of files that are redundant copies across all groups.
    #[must_use]
    pub fn duplicate_files(&self) -> usize {
        self.groups.iter().map(DuplicateGroup::duplicate_count).sum()
    }

    /// Bytes reclaimable by keeping one copy per group.
    #[must_use]
    pub fn reclaimable_space(&self) -> u64 {
        self.groups.iter().map(DuplicateGroup::wasted_space).sum()
    }

    /// Iterate over groups in order.
    pub fn iter(&self) -> std::slice::Iter<'_, DuplicateGroup> {
        self.groups.iter()
    }
}

impl<'a> IntoIterator for &'a DuplicateSet {
    type Item = &'a DuplicateGroup;
    type IntoIter = std::slice::Iter<'a, DuplicateGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

/// Statistics from the size grouping phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingStats {
    /// Total number of files offered to the indexer
    pub total_files: usize,
    /// Total size of all files offered, in bytes
    pub total_size: u64,
    /// Files dropped because they are smaller than the threshold
    pub below_min_size: usize,
    /// Number of distinct sizes among files at or above the threshold
    pub unique_sizes: usize,
    /// Number of files that could be duplicates (in buckets of 2+)
    pub potential_duplicates: usize,
    /// Number of files eliminated as unique (singleton buckets)
    pub eliminated_unique: usize,
    /// Number of size buckets with 2+ files
    pub duplicate_groups: usize,
}

impl GroupingStats {
    /// Percentage of files eliminated by size grouping.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            ((self.total_files - self.potential_duplicates) as f64 / self.total_files as f64)
                * 100.0
        }
    }
}

/// Group files by size (Phase 1 of duplicate detection).
///
/// Files smaller than `min_size` are dropped, the rest are bucketed by exact
/// size, and single-member buckets are discarded. Buckets come back ordered
/// by the discovery index of their first member, and records keep their
/// discovery order inside a bucket. No file I/O is performed.
///
/// Empty files are not special: with `min_size` of 0 they form a bucket like
/// any other size.
///
/// # Example
///
/// ```
/// use dupefind::scanner::FileEntry;
/// use dupefind::duplicates::group_by_size;
/// use std::path::PathBuf;
/// use std::time::SystemTime;
///
/// let files = vec![
///     FileEntry::new(PathBuf::from("/a.txt"), 100, SystemTime::now()),
///     FileEntry::new(PathBuf::from("/b.txt"), 100, SystemTime::now()),
///     FileEntry::new(PathBuf::from("/c.txt"), 200, SystemTime::now()),
/// ];
///
/// let (groups, stats) = group_by_size(files, 0);
///
/// assert_eq!(groups.len(), 1);
/// assert_eq!(groups[0].size, 100);
/// assert_eq!(stats.eliminated_unique, 1);
/// ```
#[must_use]
pub fn group_by_size(
    files: impl IntoIterator<Item = FileEntry>,
    min_size: u64,
) -> (Vec<SizeGroup>, GroupingStats) {
    let mut buckets: HashMap<u64, SizeGroup> = HashMap::new();
    let mut stats = GroupingStats::default();

    for (order, file) in files.into_iter().enumerate() {
        stats.total_files += 1;
        stats.total_size += file.size;

        if file.size < min_size {
            stats.below_min_size += 1;
            log::trace!(
                "Below minimum size ({} < {}): {}",
                file.size,
                min_size,
                file.path.display()
            );
            continue;
        }

        let size = file.size;
        buckets
            .entry(size)
            .or_insert_with(|| SizeGroup::new(size))
            .add(FileRecord::from_entry(file, order));
    }

    stats.unique_sizes = buckets.len();

    let mut groups: Vec<SizeGroup> = buckets
        .into_values()
        .filter(|group| {
            if group.has_duplicates() {
                stats.potential_duplicates += group.len();
                stats.duplicate_groups += 1;
                log::debug!(
                    "Size group {} bytes: {} potential duplicates",
                    group.size,
                    group.len()
                );
                true
            } else {
                stats.eliminated_unique += 1;
                if let Some(record) = group.records.first() {
                    log::trace!(
                        "Eliminated unique size {}: {}",
                        group.size,
                        record.path.display()
                    );
                }
                false
            }
        })
        .collect();

    groups.sort_by_key(SizeGroup::first_order);

    log::info!(
        "Phase 1 complete: {} files → {} potential duplicates ({:.1}% eliminated)",
        stats.total_files,
        stats.potential_duplicates,
        stats.elimination_rate()
    );

    (groups, stats)
}

/// Assemble the final duplicate set (Phase 4).
///
/// Groups with fewer than two members are dropped; the rest are ordered by
/// the discovery index of their first member.
#[must_use]
pub fn assemble_duplicate_set(
    groups: Vec<DigestGroup>,
    diagnostics: Vec<Diagnostic>,
    algorithm: DigestAlgorithm,
    verified: bool,
) -> DuplicateSet {
    let mut groups: Vec<DigestGroup> = groups.into_iter().filter(|g| g.len() > 1).collect();
    groups.sort_by_key(DigestGroup::first_order);

    DuplicateSet {
        groups: groups.into_iter().map(DuplicateGroup::from).collect(),
        diagnostics,
        algorithm,
        verified,
    }
}
