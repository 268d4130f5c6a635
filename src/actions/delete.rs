//! File removal backends and deletion-time safety checks.
//!
//! # Overview
//!
//! - Permanent deletion (default)
//! - Move to system trash (recoverable)
//! - Dry-run mode that reports without touching the filesystem
//! - Snapshot verification: a file is only removed if its size and
//!   modification time still match what was observed during the scan, and
//!   the copy being kept still exists
//!
//! # Example
//!
//! ```no_run
//! use dupefind::actions::delete::{delete_verified, DeleteConfig};
//! use dupefind::scanner::FileEntry;
//! use std::path::Path;
//!
//! let entry = FileEntry::from_path(Path::new("/data/copy.txt")).unwrap();
//! match delete_verified(&entry, Path::new("/data/original.txt"), &DeleteConfig::default()) {
//!     Ok(result) => println!("Removed: {}", result.path.display()),
//!     Err(e) => eprintln!("Failed: {}", e),
//! }
//! ```

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scanner::{same_file, FileEntry};

/// Error type for deletion operations.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// File was not found (may have been deleted or moved).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when attempting to delete.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// File was modified since scan.
    #[error("file modified since scan: {0}")]
    Modified(PathBuf),

    /// The copy that would be kept no longer exists.
    #[error("retained copy {retained} is missing, refusing to delete {path}")]
    RetainedMissing {
        /// File that would have been deleted
        path: PathBuf,
        /// Member that was supposed to survive
        retained: PathBuf,
    },

    /// The candidate is the retained copy under another name (hard link or
    /// symlink), so removing it would remove the content being kept.
    #[error("{path} is the same file as retained copy {retained}")]
    SameAsRetained {
        /// File that would have been deleted
        path: PathBuf,
        /// Member that was supposed to survive
        retained: PathBuf,
    },

    /// Trash operation failed.
    #[error("trash operation failed for {path}: {message}")]
    TrashFailed {
        /// File that could not be trashed
        path: PathBuf,
        /// Backend message
        message: String,
    },

    /// Permanent delete operation failed.
    #[error("permanent delete failed for {path}: {message}")]
    PermanentDeleteFailed {
        /// File that could not be removed
        path: PathBuf,
        /// OS message
        message: String,
    },

    /// Attempted to delete all copies (at least one must be preserved).
    #[error("cannot delete all copies - at least one file must be preserved")]
    AllCopiesWouldBeDeleted,

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl DeleteError {
    /// Get the path associated with this error (if any).
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::Modified(p)
            | Self::RetainedMissing { path: p, .. }
            | Self::SameAsRetained { path: p, .. }
            | Self::TrashFailed { path: p, .. }
            | Self::PermanentDeleteFailed { path: p, .. }
            | Self::Io { path: p, .. } => Some(p),
            Self::AllCopiesWouldBeDeleted => None,
        }
    }

    fn from_io(path: &Path, e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: e,
            },
        }
    }
}

/// How files are removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemovalMode {
    /// `std::fs::remove_file`, not recoverable
    #[default]
    Permanent,
    /// Move to the platform trash
    Trash,
}

impl fmt::Display for RemovalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Permanent => f.write_str("permanent"),
            Self::Trash => f.write_str("trash"),
        }
    }
}

/// Result of a successful deletion operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteResult {
    /// Path that was deleted.
    pub path: PathBuf,
    /// Size of the deleted file in bytes.
    pub size: u64,
    /// Backend used.
    pub mode: RemovalMode,
    /// True if nothing was actually removed.
    pub dry_run: bool,
}

impl DeleteResult {
    /// Create a new delete result.
    #[must_use]
    pub fn new(path: PathBuf, size: u64, mode: RemovalMode) -> Self {
        Self {
            path,
            size,
            mode,
            dry_run: false,
        }
    }
}

/// Configuration for deletion operations.
#[derive(Debug, Clone)]
pub struct DeleteConfig {
    /// Removal backend.
    pub removal: RemovalMode,
    /// Refuse to delete files whose size or mtime changed since the scan.
    pub verify_snapshot: bool,
    /// Report what would be removed without removing anything.
    pub dry_run: bool,
}

impl Default for DeleteConfig {
    fn default() -> Self {
        Self {
            removal: RemovalMode::Permanent,
            verify_snapshot: true,
            dry_run: false,
        }
    }
}

impl DeleteConfig {
    /// Create config for trash deletion.
    #[must_use]
    pub fn trash() -> Self {
        Self {
            removal: RemovalMode::Trash,
            ..Self::default()
        }
    }

    /// Create config for permanent deletion.
    #[must_use]
    pub fn permanent() -> Self {
        Self::default()
    }

    /// Set the removal backend.
    #[must_use]
    pub fn with_removal(mut self, removal: RemovalMode) -> Self {
        self.removal = removal;
        self
    }

    /// Enable/disable snapshot verification.
    #[must_use]
    pub fn with_verify_snapshot(mut self, verify: bool) -> Self {
        self.verify_snapshot = verify;
        self
    }

    /// Enable/disable dry-run mode.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// File metadata snapshot used to detect changes since the scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSnapshot {
    /// Path to the file.
    pub path: PathBuf,
    /// File size in bytes.
    pub size: u64,
    /// Last modification time.
    pub mtime: Option<SystemTime>,
}

impl FileSnapshot {
    /// Create a snapshot of a file's current state.
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist or can't be accessed.
    pub fn capture(path: &Path) -> Result<Self, DeleteError> {
        let metadata = fs::metadata(path).map_err(|e| DeleteError::from_io(path, e))?;

        Ok(Self {
            path: path.to_path_buf(),
            size: metadata.len(),
            mtime: metadata.modified().ok(),
        })
    }

    /// Snapshot recorded during the scan.
    #[must_use]
    pub fn from_entry(entry: &FileEntry) -> Self {
        Self {
            path: entry.path.clone(),
            size: entry.size,
            mtime: Some(entry.modified),
        }
    }

    /// Verify that the file on disk still matches this snapshot.
    ///
    /// # Errors
    ///
    /// Returns error if file was modified, deleted, or can't be accessed.
    pub fn verify(&self) -> Result<(), DeleteError> {
        let current = Self::capture(&self.path)?;

        if let (Some(orig), Some(curr)) = (self.mtime, current.mtime) {
            if orig != curr {
                log::warn!(
                    "File modified since scan: {} (mtime changed)",
                    self.path.display()
                );
                return Err(DeleteError::Modified(self.path.clone()));
            }
        }

        if self.size != current.size {
            log::warn!(
                "File modified since scan: {} (size changed from {} to {})",
                self.path.display(),
                self.size,
                current.size
            );
            return Err(DeleteError::Modified(self.path.clone()));
        }

        Ok(())
    }
}

/// Move a single file to the system trash.
///
/// # Errors
///
/// - `NotFound` if the file doesn't exist
/// - `PermissionDenied` if deletion is not allowed
/// - `TrashFailed` if the trash operation fails
pub fn delete_to_trash(path: &Path) -> Result<DeleteResult, DeleteError> {
    let size = fs::metadata(path)
        .map_err(|e| DeleteError::from_io(path, e))?
        .len();

    trash::delete(path).map_err(|e| {
        log::error!("Trash operation failed for {}: {}", path.display(), e);
        DeleteError::TrashFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;

    log::info!("Moved to trash: {} ({} bytes)", path.display(), size);

    Ok(DeleteResult::new(path.to_path_buf(), size, RemovalMode::Trash))
}

/// Permanently delete a single file.
///
/// # Errors
///
/// - `NotFound` if the file doesn't exist
/// - `PermissionDenied` if deletion is not allowed
/// - `PermanentDeleteFailed` if the delete operation fails
pub fn permanent_delete(path: &Path) -> Result<DeleteResult, DeleteError> {
    let size = fs::metadata(path)
        .map_err(|e| DeleteError::from_io(path, e))?
        .len();

    fs::remove_file(path).map_err(|e| {
        log::error!("Permanent delete failed for {}: {}", path.display(), e);
        DeleteError::PermanentDeleteFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;

    log::info!("Permanently deleted: {} ({} bytes)", path.display(), size);

    Ok(DeleteResult::new(path.to_path_buf(), size, RemovalMode::Permanent))
}

/// Delete a duplicate after confirming it is still safe to do so.
///
/// Checks, in order, that `retained` still exists, that the candidate is
/// not the retained file under another name, and (if enabled) that the
/// candidate's size and mtime match the scan. In dry-run mode the checks
/// still run but nothing is removed.
///
/// # Errors
///
/// - `RetainedMissing` if the surviving copy is gone
/// - `SameAsRetained` if both paths resolve to one file on disk
/// - `Modified` if the candidate changed since the scan
/// - Other errors from `delete_to_trash` or `permanent_delete`
pub fn delete_verified(
    entry: &FileEntry,
    retained: &Path,
    config: &DeleteConfig,
) -> Result<DeleteResult, DeleteError> {
    if fs::metadata(retained).is_err() {
        log::warn!(
            "Retained copy {} is missing, keeping {}",
            retained.display(),
            entry.path.display()
        );
        return Err(DeleteError::RetainedMissing {
            path: entry.path.clone(),
            retained: retained.to_path_buf(),
        });
    }

    match same_file(&entry.path, retained) {
        Ok(false) => {}
        Ok(true) => {
            log::warn!(
                "{} and retained copy {} are the same file, keeping both",
                entry.path.display(),
                retained.display()
            );
            return Err(DeleteError::SameAsRetained {
                path: entry.path.clone(),
                retained: retained.to_path_buf(),
            });
        }
        Err(e) => return Err(DeleteError::from_io(&entry.path, e)),
    }

    if config.verify_snapshot {
        FileSnapshot::from_entry(entry).verify()?;
    }

    if config.dry_run {
        log::info!("Would remove ({}): {}", config.removal, entry.path.display());
        return Ok(DeleteResult {
            path: entry.path.clone(),
            size: entry.size,
            mode: config.removal,
            dry_run: true,
        });
    }

    match config.removal {
        RemovalMode::Permanent => permanent_delete(&entry.path),
        RemovalMode::Trash => delete_to_trash(&entry.path),
    }
}

/// Validate that a selection doesn't delete all copies.
///
/// # Errors
///
/// Returns `AllCopiesWouldBeDeleted` if all copies would be deleted.
///
/// # Example
///
/// ```
/// use dupefind::actions::delete::validate_preserves_copy;
/// use std::path::PathBuf;
///
/// let group = vec![
///     PathBuf::from("/original.txt"),
///     PathBuf::from("/copy1.txt"),
///     PathBuf::from("/copy2.txt"),
/// ];
///
/// let selected = vec![PathBuf::from("/copy1.txt"), PathBuf::from("/copy2.txt")];
/// assert!(validate_preserves_copy(&selected, &group).is_ok());
///
/// assert!(validate_preserves_copy(&group, &group).is_err());
/// ```
pub fn validate_preserves_copy(
    selected_paths: &[PathBuf],
    group_paths: &[PathBuf],
) -> Result<(), DeleteError> {
    use std::collections::HashSet;

    let selected_set: HashSet<&PathBuf> = selected_paths.iter().collect();
    let preserved_count = group_paths
        .iter()
        .filter(|p| !selected_set.contains(p))
        .count();

    if preserved_count == 0 {
        log::debug!(
            "Selection covers all {} copies of a duplicate group",
            group_paths.len()
        );
        Err(DeleteError::AllCopiesWouldBeDeleted)
    } else {
        log::debug!(
            "Deletion validated: {} files selected, {} preserved",
            selected_paths.len(),
            preserved_count
        );
        Ok(())
    }
}
