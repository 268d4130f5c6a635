//! Physical file identity.
//!
//! Two directory entries can name the same bytes on disk: hard links share an
//! inode, and a followed symlink resolves to its target. Such entries are the
//! same file, not duplicates of each other, so the walker admits each
//! underlying file once and the deletion path refuses to remove a candidate
//! that is the retained copy under another name.
//!
//! On Unix a file is identified by its `(device, inode)` pair. Other
//! platforms have no identity in [`std::fs::Metadata`]; there the tracker
//! admits everything and [`same_file`] falls back to comparing canonical
//! paths, which still catches symlinks.

use std::collections::HashSet;
use std::fs::{self, Metadata};
use std::io;
use std::path::Path;

/// Identity of the file a path resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId {
    dev: u64,
    ino: u64,
}

impl FileId {
    /// Identity from metadata, if the platform exposes one.
    #[cfg(unix)]
    #[must_use]
    pub fn from_metadata(metadata: &Metadata) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;
        Some(Self {
            dev: metadata.dev(),
            ino: metadata.ino(),
        })
    }

    /// Identity from metadata, if the platform exposes one.
    #[cfg(not(unix))]
    #[must_use]
    pub fn from_metadata(_metadata: &Metadata) -> Option<Self> {
        None
    }
}

/// Remembers which files have already been admitted to a scan.
#[derive(Debug, Default)]
pub struct SameFileTracker {
    seen: HashSet<FileId>,
}

impl SameFileTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `metadata`'s file and report whether it was seen before.
    ///
    /// Always `false` when the platform has no file identity.
    pub fn is_seen(&mut self, metadata: &Metadata) -> bool {
        match FileId::from_metadata(metadata) {
            Some(id) => !self.seen.insert(id),
            None => false,
        }
    }

    /// Number of distinct files recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Check whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Check whether `a` and `b` resolve to the same file on disk.
///
/// Symlinks are followed.
///
/// # Errors
///
/// Returns the I/O error if either path cannot be resolved.
pub fn same_file(a: &Path, b: &Path) -> io::Result<bool> {
    let (meta_a, meta_b) = (fs::metadata(a)?, fs::metadata(b)?);
    match (FileId::from_metadata(&meta_a), FileId::from_metadata(&meta_b)) {
        (Some(id_a), Some(id_b)) => Ok(id_a == id_b),
        _ => Ok(fs::canonicalize(a)? == fs::canonicalize(b)?),
    }
}
