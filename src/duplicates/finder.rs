//! Duplicate finder implementation with multi-phase detection.
//!
//! # Overview
//!
//! This module orchestrates the duplicate detection pipeline:
//! 1. **Phase 1 - Size grouping**: Group files by size (see [`crate::duplicates::groups`])
//! 2. **Phase 2 - Digest**: Digest every member of a multi-file size bucket
//! 3. **Phase 3 - Verify** (optional): Byte-compare members against the first
//!    (see [`crate::duplicates::verify`])
//! 4. **Phase 4 - Assembly**: Order surviving groups into a [`DuplicateSet`]
//!
//! Digesting runs on a bounded rayon pool so at most `io_threads` files are
//! open at once. Results are collected in input order, so the output never
//! depends on which thread finished first.
//!
//! # Example
//!
//! ```no_run
//! use dupefind::duplicates::{group_by_size, group_by_digest, DigestConfig};
//! use dupefind::scanner::{DigestAlgorithm, FileEntry, Hasher, Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("."), WalkerConfig::default());
//! let files: Vec<FileEntry> = walker.walk().filter_map(Result::ok).collect();
//! let (size_groups, _) = group_by_size(files, 1);
//!
//! let hasher = Hasher::new(DigestAlgorithm::Sha1);
//! let (digest_groups, stats, diagnostics) =
//!     group_by_digest(size_groups, &hasher, &DigestConfig::default());
//!
//! println!("{} groups, {} files digested", digest_groups.len(), stats.digested_files);
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;

use super::groups::{
    assemble_duplicate_set, group_by_size, Diagnostic, DigestGroup, DuplicateSet, SizeGroup,
};
use super::verify::{verify_groups, VerifyConfig};
use crate::progress::{ProgressCallback, PHASE_DIGEST, PHASE_WALKING};
use crate::scanner::{
    Digest, DigestAlgorithm, DigestError, Digester, FileEntry, Hasher, Walker, WalkerConfig,
};

/// Default number of concurrent file readers.
pub const DEFAULT_IO_THREADS: usize = 4;

/// Bounded worker pool for file I/O.
///
/// Falls back to running on the calling thread if the pool cannot be built.
pub(crate) struct IoPool {
    pool: Option<rayon::ThreadPool>,
}

impl IoPool {
    pub(crate) fn new(threads: usize) -> Self {
        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .thread_name(|i| format!("dupefind-io-{i}"))
            .build()
        {
            Ok(pool) => Some(pool),
            Err(e) => {
                log::warn!("Failed to create I/O thread pool, running sequentially: {}", e);
                None
            }
        };
        Self { pool }
    }

    /// Map `f` over `items`, returning results in input order.
    pub(crate) fn map<T, R, F>(&self, items: Vec<T>, f: F) -> Vec<R>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> R + Send + Sync,
    {
        match &self.pool {
            Some(pool) => pool.install(|| items.into_par_iter().map(&f).collect()),
            None => items.into_iter().map(f).collect(),
        }
    }
}

/// Configuration for the digest phase.
#[derive(Clone)]
pub struct DigestConfig {
    /// Number of I/O threads for parallel digesting.
    /// Default is 4 to prevent disk thrashing.
    pub io_threads: usize,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for DigestConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DigestConfig")
            .field("io_threads", &self.io_threads)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            io_threads: DEFAULT_IO_THREADS,
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl DigestConfig {
    /// Set the number of I/O threads (minimum 1).
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Statistics from the digest phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DigestStats {
    /// Files handed to the phase
    pub input_files: usize,
    /// Files digested successfully
    pub digested_files: usize,
    /// Files excluded because digesting failed
    pub failed_files: usize,
    /// Bytes read while digesting
    pub bytes_hashed: u64,
    /// Digest groups with 2+ members
    pub digest_groups: usize,
    /// Files in those groups
    pub grouped_files: usize,
    /// Whether the phase stopped early
    pub interrupted: bool,
}

/// Group files by content digest (Phase 2 of duplicate detection).
///
/// Only members of the given size groups are digested. A file whose digest
/// fails is dropped and reported as a [`Diagnostic`]; groups reduced to a
/// single member are dropped. Groups are returned ordered by the discovery
/// index of their first member.
#[must_use]
pub fn group_by_digest(
    size_groups: Vec<SizeGroup>,
    digester: &dyn Digester,
    config: &DigestConfig,
) -> (Vec<DigestGroup>, DigestStats, Vec<Diagnostic>) {
    let work: Vec<(usize, super::groups::FileRecord)> = size_groups
        .into_iter()
        .enumerate()
        .flat_map(|(bucket, group)| group.records.into_iter().map(move |r| (bucket, r)))
        .collect();

    let mut stats = DigestStats {
        input_files: work.len(),
        ..Default::default()
    };
    let mut diagnostics = Vec::new();

    if work.is_empty() {
        log::debug!("Phase 2: No files to digest");
        return (Vec::new(), stats, diagnostics);
    }

    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_start(PHASE_DIGEST, work.len());
    }

    log::info!(
        "Phase 2: Computing {} digests for {} files",
        digester.algorithm(),
        work.len()
    );

    let pool = IoPool::new(config.io_threads);
    let completed = AtomicUsize::new(0);

    let results = pool.map(work, |(bucket, record)| {
        if config.is_shutdown_requested() {
            let err = DigestError::Interrupted(record.path.clone());
            return (bucket, record, Err(err));
        }

        let result = digester.digest(&record.path, record.size);

        let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(ref callback) = config.progress_callback {
            callback.on_progress(done, record.path.to_string_lossy().as_ref());
            if result.is_ok() {
                callback.on_item_completed(record.size);
            }
        }

        (bucket, record, result)
    });

    // Results arrive in input order: bucket by bucket, discovery order within.
    let mut groups: Vec<DigestGroup> = Vec::new();
    let mut index: HashMap<(usize, Digest), usize> = HashMap::new();

    for (bucket, mut record, result) in results {
        match result {
            Ok(digest) => {
                stats.digested_files += 1;
                stats.bytes_hashed += record.size;
                record.digest = Some(digest.clone());

                let key = (bucket, digest);
                let existing = index.get(&key).copied();
                match existing {
                    Some(i) => groups[i].records.push(record),
                    None => {
                        index.insert(key.clone(), groups.len());
                        groups.push(DigestGroup {
                            size: record.size,
                            digest: key.1,
                            records: vec![record],
                        });
                    }
                }
            }
            Err(DigestError::Interrupted(_)) => {
                stats.interrupted = true;
            }
            Err(e) => {
                log::warn!("Failed to digest {}: {}", record.path.display(), e);
                stats.failed_files += 1;
                diagnostics.push(Diagnostic::from(&e));
            }
        }
    }

    if stats.interrupted {
        log::info!("Phase 2: Interrupted by shutdown signal");
    }

    let mut groups: Vec<DigestGroup> = groups
        .into_iter()
        .filter(|g| {
            if g.len() > 1 {
                log::debug!(
                    "Digest group {}: {} files, {} bytes each",
                    g.digest,
                    g.len(),
                    g.size
                );
                true
            } else {
                false
            }
        })
        .collect();
    groups.sort_by_key(DigestGroup::first_order);

    stats.digest_groups = groups.len();
    stats.grouped_files = groups.iter().map(DigestGroup::len).sum();

    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_end(PHASE_DIGEST);
    }

    log::info!(
        "Phase 2 complete: {} files digested → {} groups ({} failed)",
        stats.digested_files,
        stats.digest_groups,
        stats.failed_files
    );

    (groups, stats, diagnostics)
}

// ============================================================================
// DuplicateFinder - Pipeline Orchestrator
// ============================================================================

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Digest algorithm.
    pub algorithm: DigestAlgorithm,
    /// Files smaller than this many bytes are ignored.
    pub min_size: u64,
    /// Byte-compare group members after digest matching.
    pub verify: bool,
    /// Number of I/O threads for digesting and verification.
    pub io_threads: usize,
    /// Walker configuration for directory traversal.
    pub walker_config: WalkerConfig,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("algorithm", &self.algorithm)
            .field("min_size", &self.min_size)
            .field("verify", &self.verify)
            .field("io_threads", &self.io_threads)
            .field("walker_config", &self.walker_config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            algorithm: DigestAlgorithm::default(),
            min_size: 0,
            verify: false,
            io_threads: DEFAULT_IO_THREADS,
            walker_config: WalkerConfig::default(),
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the digest algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: DigestAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the minimum file size.
    #[must_use]
    pub fn with_min_size(mut self, min_size: u64) -> Self {
        self.min_size = min_size;
        self
    }

    /// Enable byte-for-byte verification.
    #[must_use]
    pub fn with_verify(mut self, enabled: bool) -> Self {
        self.verify = enabled;
        self
    }

    /// Set the number of I/O threads (minimum 1).
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    fn digest_config(&self) -> DigestConfig {
        DigestConfig {
            io_threads: self.io_threads,
            shutdown_flag: self.shutdown_flag.clone(),
            progress_callback: self.progress_callback.clone(),
        }
    }

    fn verify_config(&self) -> VerifyConfig {
        VerifyConfig {
            io_threads: self.io_threads,
            shutdown_flag: self.shutdown_flag.clone(),
            progress_callback: self.progress_callback.clone(),
            ..VerifyConfig::default()
        }
    }
}

/// Summary statistics from a duplicate scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanSummary {
    /// Files offered to the engine
    pub total_files: usize,
    /// Total size of those files in bytes
    pub total_size: u64,
    /// Files ignored for being smaller than the minimum size
    pub below_min_size: usize,
    /// Files identified as having no duplicate
    pub unique_files: usize,
    /// Files excluded from comparison because of an error
    pub excluded_files: usize,
    /// Paths that could not be listed or sized during traversal
    pub scan_errors: usize,
    /// Number of confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Redundant copies across all groups (excluding the retained copy)
    pub duplicate_files: usize,
    /// Bytes reclaimable by keeping one copy per group
    pub reclaimable_space: u64,
    /// Members removed by verification because their bytes differed
    pub collisions_rejected: usize,
    /// Bytes read while digesting
    pub bytes_hashed: u64,
    /// Duration of the entire scan
    pub scan_duration: Duration,
    /// Digest algorithm used
    pub algorithm: DigestAlgorithm,
    /// Whether groups were confirmed byte-for-byte
    pub verified: bool,
}

impl ScanSummary {
    /// Percentage of scanned bytes taken up by redundant copies.
    #[must_use]
    pub fn wasted_percentage(&self) -> f64 {
        if self.total_size == 0 {
            0.0
        } else {
            (self.reclaimable_space as f64 / self.total_size as f64) * 100.0
        }
    }

    /// Format reclaimable space as a human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        bytesize::ByteSize(self.reclaimable_space).to_string()
    }

    /// Format total size as a human-readable string.
    #[must_use]
    pub fn total_size_display(&self) -> String {
        bytesize::ByteSize(self.total_size).to_string()
    }
}

/// Errors that can occur during duplicate finding.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(std::path::PathBuf),

    /// The provided path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(std::path::PathBuf),

    /// An I/O error occurred while validating the input.
    #[error("I/O error for {path}: {source}")]
    IoWithPath {
        /// Path where the error occurred
        path: std::path::PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Duplicate finder that orchestrates the multi-phase detection pipeline.
///
/// # Example
///
/// ```no_run
/// use dupefind::duplicates::{DuplicateFinder, FinderConfig};
/// use dupefind::scanner::DigestAlgorithm;
/// use std::path::Path;
///
/// let config = FinderConfig::default()
///     .with_algorithm(DigestAlgorithm::Sha1)
///     .with_verify(true);
/// let finder = DuplicateFinder::new(config);
///
/// let (set, summary) = finder.find_duplicates(Path::new("/some/path")).unwrap();
///
/// println!("Found {} duplicate groups", set.len());
/// println!("Reclaimable space: {}", summary.reclaimable_display());
/// ```
pub struct DuplicateFinder {
    config: FinderConfig,
    digester: Arc<dyn Digester>,
}

impl DuplicateFinder {
    /// Create a new duplicate finder using the streaming [`Hasher`].
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        let mut hasher = Hasher::new(config.algorithm);
        if let Some(ref flag) = config.shutdown_flag {
            hasher = hasher.with_shutdown_flag(flag.clone());
        }
        Self {
            config,
            digester: Arc::new(hasher),
        }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// Create a finder that digests with a caller-supplied [`Digester`].
    ///
    /// The configured algorithm is ignored in favor of the digester's.
    #[must_use]
    pub fn with_digester(config: FinderConfig, digester: Arc<dyn Digester>) -> Self {
        Self { config, digester }
    }

    /// The finder configuration.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Find all duplicate files under the given directory.
    ///
    /// # Errors
    ///
    /// Returns `FinderError` if:
    /// - The path does not exist
    /// - The path is not a directory
    /// - The scan is interrupted by shutdown signal
    pub fn find_duplicates(&self, path: &Path) -> Result<(DuplicateSet, ScanSummary), FinderError> {
        let start_time = Instant::now();

        let metadata = std::fs::metadata(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                FinderError::PathNotFound(path.to_path_buf())
            } else {
                FinderError::IoWithPath {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        if !metadata.is_dir() {
            return Err(FinderError::NotADirectory(path.to_path_buf()));
        }

        log::info!("Starting duplicate scan of {}", path.display());

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start(PHASE_WALKING, 0);
            callback.on_message(&format!("Walking {}", path.display()));
        }

        let mut walker = Walker::new(path, self.config.walker_config.clone());
        if let Some(ref flag) = self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(flag.clone());
        }

        let mut files = Vec::new();
        let mut diagnostics = Vec::new();
        for result in walker.walk() {
            match result {
                Ok(file) => {
                    if let Some(ref callback) = self.config.progress_callback {
                        callback.on_progress(files.len() + 1, file.path.to_string_lossy().as_ref());
                    }
                    files.push(file);
                }
                Err(e) => diagnostics.push(Diagnostic::from(&e)),
            }
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end(PHASE_WALKING);
        }

        log::info!(
            "Found {} files ({} scan errors)",
            files.len(),
            diagnostics.len()
        );

        self.run_pipeline(files, diagnostics, start_time)
    }

    /// Find duplicates among an already-discovered, already-filtered file list.
    ///
    /// Discovery order is the order of `files`; the first member of each
    /// resulting group is the earliest file in this list.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::Interrupted`] if shutdown is requested.
    pub fn find_duplicates_from_files(
        &self,
        files: Vec<FileEntry>,
    ) -> Result<(DuplicateSet, ScanSummary), FinderError> {
        log::info!("Starting duplicate scan of {} files", files.len());
        self.run_pipeline(files, Vec::new(), Instant::now())
    }

    fn run_pipeline(
        &self,
        files: Vec<FileEntry>,
        mut diagnostics: Vec<Diagnostic>,
        start_time: Instant,
    ) -> Result<(DuplicateSet, ScanSummary), FinderError> {
        let algorithm = self.digester.algorithm();
        let mut summary = ScanSummary {
            algorithm,
            verified: self.config.verify,
            scan_errors: diagnostics.len(),
            ..Default::default()
        };

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        log::info!("Phase 1: Grouping by size...");
        let (size_groups, size_stats) = group_by_size(files, self.config.min_size);
        summary.total_files = size_stats.total_files;
        summary.total_size = size_stats.total_size;
        summary.below_min_size = size_stats.below_min_size;

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        let (mut digest_groups, digest_stats, digest_diagnostics) =
            group_by_digest(size_groups, self.digester.as_ref(), &self.config.digest_config());
        summary.bytes_hashed = digest_stats.bytes_hashed;
        diagnostics.extend(digest_diagnostics);

        if digest_stats.interrupted || self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        if self.config.verify {
            log::info!("Phase 3: Verifying {} groups byte-for-byte...", digest_groups.len());
            let (verified, verify_stats, verify_diagnostics) =
                verify_groups(digest_groups, &self.config.verify_config());
            digest_groups = verified;
            summary.collisions_rejected = verify_stats.collisions_rejected;
            diagnostics.extend(verify_diagnostics);

            if verify_stats.interrupted || self.config.is_shutdown_requested() {
                return Err(FinderError::Interrupted);
            }
        }

        let set = assemble_duplicate_set(digest_groups, diagnostics, algorithm, self.config.verify);

        let grouped_files: usize = set.groups.iter().map(|g| g.len()).sum();
        let engine_exclusions = set
            .diagnostics
            .iter()
            .filter(|d| d.is_exclusion() && !matches!(d, Diagnostic::ScanFailed { .. }))
            .count();

        summary.excluded_files = set.diagnostics.iter().filter(|d| d.is_exclusion()).count();
        summary.unique_files = summary
            .total_files
            .saturating_sub(summary.below_min_size)
            .saturating_sub(engine_exclusions)
            .saturating_sub(grouped_files);
        summary.duplicate_groups = set.len();
        summary.duplicate_files = set.duplicate_files();
        summary.reclaimable_space = set.reclaimable_space();
        summary.scan_duration = start_time.elapsed();

        log::info!(
            "Scan complete: {} groups, {} duplicates, {} reclaimable in {:.2?}",
            summary.duplicate_groups,
            summary.duplicate_files,
            summary.reclaimable_display(),
            summary.scan_duration
        );

        Ok((set, summary))
    }
}
