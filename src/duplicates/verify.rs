//! Byte-for-byte verification of digest groups (Phase 3).
//!
//! Each member of a group is streamed against the group's first member in
//! fixed-size chunks. Members whose bytes differ are removed and reported as
//! [`Diagnostic::CollisionRejected`]; members that cannot be read are removed
//! and reported as [`Diagnostic::UnreadableFile`]. When the first member
//! itself cannot be read, it is dropped and the group is re-checked against
//! the next member.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use super::finder::{IoPool, DEFAULT_IO_THREADS};
use super::groups::{Diagnostic, DigestGroup, FileRecord};
use crate::progress::{ProgressCallback, PHASE_VERIFY};
use crate::scanner::hasher::BUFFER_SIZE;

/// Configuration for the verification phase.
#[derive(Clone)]
pub struct VerifyConfig {
    /// Number of groups verified concurrently.
    pub io_threads: usize,
    /// Chunk size used when comparing.
    pub buffer_size: usize,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for VerifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerifyConfig")
            .field("io_threads", &self.io_threads)
            .field("buffer_size", &self.buffer_size)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            io_threads: DEFAULT_IO_THREADS,
            buffer_size: BUFFER_SIZE,
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl VerifyConfig {
    /// Set the comparison chunk size (minimum 1 byte).
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(1);
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Statistics from the verification phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyStats {
    /// Groups handed to the phase
    pub input_groups: usize,
    /// Groups that still have 2+ members afterwards
    pub confirmed_groups: usize,
    /// Pairwise comparisons performed
    pub comparisons: usize,
    /// Members removed because their bytes differed
    pub collisions_rejected: usize,
    /// Members removed because they could not be read
    pub unreadable_files: usize,
    /// Whether the phase stopped early
    pub interrupted: bool,
}

/// Which side of a comparison failed.
#[derive(Debug)]
enum CompareError {
    Anchor(io::Error),
    Candidate(io::Error),
}

/// Compare two files chunk by chunk.
///
/// Returns `Ok(false)` on the first differing chunk or length mismatch.
fn files_identical(anchor: &Path, candidate: &Path, buffer_size: usize) -> Result<bool, CompareError> {
    let mut left = File::open(anchor).map_err(CompareError::Anchor)?;
    let mut right = File::open(candidate).map_err(CompareError::Candidate)?;

    let mut left_buf = vec![0u8; buffer_size];
    let mut right_buf = vec![0u8; buffer_size];

    loop {
        let n_left = read_chunk(&mut left, &mut left_buf).map_err(CompareError::Anchor)?;
        let n_right = read_chunk(&mut right, &mut right_buf).map_err(CompareError::Candidate)?;

        if n_left != n_right || left_buf[..n_left] != right_buf[..n_right] {
            return Ok(false);
        }
        if n_left == 0 {
            return Ok(true);
        }
    }
}

/// Fill `buf` as far as the reader allows, returning bytes read (0 at EOF).
fn read_chunk<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[derive(Default)]
struct GroupOutcome {
    group: Option<DigestGroup>,
    diagnostics: Vec<Diagnostic>,
    comparisons: usize,
    collisions: usize,
    unreadable: usize,
    interrupted: bool,
}

fn unreadable(record: &FileRecord, error: &io::Error) -> Diagnostic {
    Diagnostic::UnreadableFile {
        path: record.path.clone(),
        reason: error.to_string(),
    }
}

fn verify_group(group: DigestGroup, config: &VerifyConfig) -> GroupOutcome {
    let mut outcome = GroupOutcome::default();
    let DigestGroup {
        size,
        digest,
        mut records,
    } = group;

    while records.len() > 1 {
        let anchor = records.remove(0);
        let mut confirmed = Vec::new();
        let mut reanchor_at = None;

        for (i, candidate) in records.iter().enumerate() {
            if config.is_shutdown_requested() {
                outcome.interrupted = true;
                return outcome;
            }

            outcome.comparisons += 1;
            match files_identical(&anchor.path, &candidate.path, config.buffer_size) {
                Ok(true) => confirmed.push(i),
                Ok(false) => {
                    log::warn!(
                        "Digest collision: {} differs from {}",
                        candidate.path.display(),
                        anchor.path.display()
                    );
                    outcome.collisions += 1;
                    outcome.diagnostics.push(Diagnostic::CollisionRejected {
                        path: candidate.path.clone(),
                        anchor: anchor.path.clone(),
                    });
                }
                Err(CompareError::Candidate(e)) => {
                    log::warn!("Failed to verify {}: {}", candidate.path.display(), e);
                    outcome.unreadable += 1;
                    outcome.diagnostics.push(unreadable(candidate, &e));
                }
                Err(CompareError::Anchor(e)) => {
                    log::warn!(
                        "Group anchor {} unreadable, re-anchoring: {}",
                        anchor.path.display(),
                        e
                    );
                    outcome.unreadable += 1;
                    outcome.diagnostics.push(unreadable(&anchor, &e));
                    reanchor_at = Some(i);
                    break;
                }
            }
        }

        // Members before the failure point that were rejected stay rejected;
        // confirmed and untested members are checked again against a new anchor.
        let cutoff = reanchor_at.unwrap_or(records.len());
        let survivors: Vec<FileRecord> = records
            .into_iter()
            .enumerate()
            .filter(|(i, _)| *i >= cutoff || confirmed.contains(i))
            .map(|(_, r)| r)
            .collect();

        if reanchor_at.is_some() {
            records = survivors;
            continue;
        }

        let mut members = vec![anchor];
        members.extend(survivors);
        if members.len() > 1 {
            outcome.group = Some(DigestGroup {
                size,
                digest,
                records: members,
            });
        }
        return outcome;
    }

    outcome
}

/// Confirm digest groups byte-for-byte (Phase 3 of duplicate detection).
///
/// Groups are processed on a bounded pool and returned in their input order.
/// Groups left with fewer than two members are dropped.
#[must_use]
pub fn verify_groups(
    groups: Vec<DigestGroup>,
    config: &VerifyConfig,
) -> (Vec<DigestGroup>, VerifyStats, Vec<Diagnostic>) {
    let mut stats = VerifyStats {
        input_groups: groups.len(),
        ..Default::default()
    };
    let mut diagnostics = Vec::new();

    if groups.is_empty() {
        log::debug!("Phase 3: No groups to verify");
        return (Vec::new(), stats, diagnostics);
    }

    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_start(PHASE_VERIFY, groups.len());
    }

    let pool = IoPool::new(config.io_threads);
    let completed = AtomicUsize::new(0);

    let outcomes = pool.map(groups, |group| {
        let label = group
            .records
            .first()
            .map(|r| r.path.to_string_lossy().into_owned())
            .unwrap_or_default();
        let outcome = verify_group(group, config);
        let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(ref callback) = config.progress_callback {
            callback.on_progress(done, &label);
        }
        outcome
    });

    let mut verified = Vec::new();
    for outcome in outcomes {
        stats.comparisons += outcome.comparisons;
        stats.collisions_rejected += outcome.collisions;
        stats.unreadable_files += outcome.unreadable;
        stats.interrupted |= outcome.interrupted;
        diagnostics.extend(outcome.diagnostics);
        if let Some(group) = outcome.group {
            verified.push(group);
        }
    }
    stats.confirmed_groups = verified.len();

    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_end(PHASE_VERIFY);
    }

    if stats.interrupted {
        log::info!("Phase 3: Interrupted by shutdown signal");
    }

    log::info!(
        "Phase 3 complete: {} of {} groups confirmed ({} collisions rejected)",
        stats.confirmed_groups,
        stats.input_groups,
        stats.collisions_rejected
    );

    (verified, stats, diagnostics)
}
