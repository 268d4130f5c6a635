//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Size-based file grouping (Phase 1)
//! - Content digest grouping (Phase 2)
//! - Optional byte-for-byte verification (Phase 3)
//! - Duplicate set assembly (Phase 4)

pub mod finder;
pub mod groups;
pub mod verify;

pub use finder::{
    group_by_digest, DigestConfig, DigestStats, DuplicateFinder, FinderConfig, FinderError,
    ScanSummary, DEFAULT_IO_THREADS,
};
pub use groups::{
    assemble_duplicate_set, group_by_size, Diagnostic, DigestGroup, DuplicateGroup, DuplicateSet,
    FileRecord, GroupingStats, SizeGroup,
};
pub use verify::{verify_groups, VerifyConfig, VerifyStats};
