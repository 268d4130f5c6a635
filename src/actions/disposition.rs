//! Disposition of duplicate groups: report, ask, or delete automatically.
//!
//! The engine never mutates the [`DuplicateSet`] it is given. Every deletion
//! failure is recorded against its group and processing moves on to the
//! next file, so one bad path never aborts a run.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;

use super::delete::{delete_verified, validate_preserves_copy, DeleteConfig, DeleteResult};
use crate::duplicates::{DuplicateGroup, DuplicateSet};

/// What to do with each duplicate group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispositionPolicy {
    /// List removal candidates, touch nothing
    #[default]
    ReportOnly,
    /// Ask a [`SelectionSource`] which members to delete
    Interactive,
    /// Keep the first member of each group, delete the rest
    Automatic,
}

impl DispositionPolicy {
    /// Resolve the policy from the two mutually exclusive flags.
    ///
    /// # Errors
    ///
    /// Returns [`DispositionError::ConflictingPolicy`] when both are set.
    pub fn from_flags(interactive: bool, automatic: bool) -> Result<Self, DispositionError> {
        match (interactive, automatic) {
            (true, true) => Err(DispositionError::ConflictingPolicy),
            (true, false) => Ok(Self::Interactive),
            (false, true) => Ok(Self::Automatic),
            (false, false) => Ok(Self::ReportOnly),
        }
    }

    /// Whether this policy may remove files.
    #[must_use]
    pub fn mutates(self) -> bool {
        !matches!(self, Self::ReportOnly)
    }
}

/// Errors that stop disposition before any group is processed.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum DispositionError {
    /// Interactive and automatic deletion were both requested.
    #[error("--interactive and --auto cannot be used together")]
    ConflictingPolicy,

    /// Interactive disposition was requested without a way to ask.
    #[error("interactive disposition requires a selection source")]
    MissingSelectionSource,
}

/// Source of per-group deletion decisions.
pub trait SelectionSource {
    /// Return the zero-based indices of `group.files` to delete.
    ///
    /// An empty vector deletes nothing. Out-of-range indices are ignored.
    fn select(&mut self, group_index: usize, group: &DuplicateGroup) -> Vec<usize>;
}

/// Selects every member except the first.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetainFirst;

impl SelectionSource for RetainFirst {
    fn select(&mut self, _group_index: usize, group: &DuplicateGroup) -> Vec<usize> {
        (1..group.len()).collect()
    }
}

/// A deletion that did not happen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletionFailure {
    /// File that was supposed to be removed
    pub path: PathBuf,
    /// Why it was left alone
    pub reason: String,
}

/// Outcome for one group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupDisposition {
    /// Position of the group in the set
    pub group_index: usize,
    /// Members that were kept
    pub retained: Vec<PathBuf>,
    /// Members selected for removal (report-only lists them here too)
    pub candidates: Vec<PathBuf>,
    /// Successful removals (or dry-run would-be removals)
    pub removed: Vec<DeleteResult>,
    /// Removals that failed
    pub failures: Vec<DeletionFailure>,
    /// The selection covered every member and was discarded
    pub selection_rejected: bool,
}

/// Result of applying a policy to a whole set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispositionReport {
    /// Policy that was applied
    pub policy: DispositionPolicy,
    /// Whether removals were simulated
    pub dry_run: bool,
    /// Per-group outcomes in set order
    pub groups: Vec<GroupDisposition>,
    /// Whether processing stopped early on shutdown
    pub interrupted: bool,
}

impl DispositionReport {
    /// Number of files removed (or that would be, in dry-run).
    #[must_use]
    pub fn removed_count(&self) -> usize {
        self.groups.iter().map(|g| g.removed.len()).sum()
    }

    /// Number of failed removals.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.groups.iter().map(|g| g.failures.len()).sum()
    }

    /// Bytes freed (or that would be, in dry-run).
    #[must_use]
    pub fn bytes_freed(&self) -> u64 {
        self.groups
            .iter()
            .flat_map(|g| &g.removed)
            .map(|r| r.size)
            .sum()
    }

    /// All failures across groups.
    pub fn failures(&self) -> impl Iterator<Item = &DeletionFailure> {
        self.groups.iter().flat_map(|g| &g.failures)
    }

    /// Human-readable summary of the operation.
    #[must_use]
    pub fn summary(&self) -> String {
        let verb = if self.dry_run { "Would delete" } else { "Deleted" };
        let freed = bytesize::ByteSize(self.bytes_freed());
        if self.failure_count() == 0 {
            format!("{} {} file(s), freed {}", verb, self.removed_count(), freed)
        } else {
            format!(
                "{} {} file(s), {} failed, freed {}",
                verb,
                self.removed_count(),
                self.failure_count(),
                freed
            )
        }
    }
}

/// Applies a [`DispositionPolicy`] to a [`DuplicateSet`].
#[derive(Debug, Clone, Default)]
pub struct DispositionEngine {
    config: DeleteConfig,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl DispositionEngine {
    /// Create an engine with the given deletion settings.
    #[must_use]
    pub fn new(config: DeleteConfig) -> Self {
        Self {
            config,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag checked between groups.
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

    /// Apply `policy` to every group in `set`.
    ///
    /// `source` is consulted only for [`DispositionPolicy::Interactive`].
    ///
    /// # Errors
    ///
    /// Returns [`DispositionError::MissingSelectionSource`] when the policy
    /// is interactive and no source was given.
    pub fn apply(
        &self,
        set: &DuplicateSet,
        policy: DispositionPolicy,
        source: Option<&mut dyn SelectionSource>,
    ) -> Result<DispositionReport, DispositionError> {
        let mut automatic = RetainFirst;
        let source: Option<&mut dyn SelectionSource> = match policy {
            DispositionPolicy::ReportOnly => None,
            DispositionPolicy::Automatic => Some(&mut automatic),
            DispositionPolicy::Interactive => {
                Some(source.ok_or(DispositionError::MissingSelectionSource)?)
            }
        };

        let mut report = DispositionReport {
            policy,
            dry_run: self.config.dry_run,
            ..Default::default()
        };

        log::info!(
            "Applying {:?} disposition to {} groups{}",
            policy,
            set.len(),
            if self.config.dry_run { " (dry run)" } else { "" }
        );

        let Some(source) = source else {
            for (index, group) in set.groups.iter().enumerate() {
                let (retained, candidates) = split_members(group, &(1..group.len()).collect());
                report.groups.push(GroupDisposition {
                    group_index: index,
                    retained,
                    candidates,
                    ..Default::default()
                });
            }
            return Ok(report);
        };

        for (index, group) in set.groups.iter().enumerate() {
            if self.is_shutdown_requested() {
                log::info!("Disposition interrupted after {} groups", index);
                report.interrupted = true;
                break;
            }
            let selection = source.select(index, group);
            report
                .groups
                .push(self.dispose_group(index, group, selection));
        }

        log::info!("{}", report.summary());
        Ok(report)
    }

    fn dispose_group(
        &self,
        index: usize,
        group: &DuplicateGroup,
        selection: Vec<usize>,
    ) -> GroupDisposition {
        let mut selected = BTreeSet::new();
        for i in selection {
            if i < group.len() {
                selected.insert(i);
            } else {
                log::warn!(
                    "Group {}: ignoring out-of-range selection {} ({} members)",
                    index + 1,
                    i,
                    group.len()
                );
            }
        }

        let mut outcome = GroupDisposition {
            group_index: index,
            ..Default::default()
        };

        let (retained, candidates) = split_members(group, &selected);
        if let Err(e) = validate_preserves_copy(&candidates, &group.paths()) {
            log::warn!("Group {}: {}, nothing deleted", index + 1, e);
            outcome.selection_rejected = true;
            outcome.retained = group.paths();
            return outcome;
        }

        outcome.retained = retained;
        outcome.candidates = candidates;

        // Guaranteed by the check above: at least one member is unselected.
        let Some(anchor) = outcome.retained.first().cloned() else {
            return outcome;
        };

        for &i in &selected {
            let entry = &group.files[i];
            match delete_verified(entry, &anchor, &self.config) {
                Ok(result) => outcome.removed.push(result),
                Err(e) => {
                    log::warn!("Failed to delete {}: {}", entry.path.display(), e);
                    outcome.failures.push(DeletionFailure {
                        path: entry.path.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        outcome
    }
}

/// Partition group members into (retained, selected) path lists.
fn split_members(group: &DuplicateGroup, selected: &BTreeSet<usize>) -> (Vec<PathBuf>, Vec<PathBuf>) {
    let mut retained = Vec::new();
    let mut candidates = Vec::new();
    for (i, file) in group.files.iter().enumerate() {
        if selected.contains(&i) {
            candidates.push(file.path.clone());
        } else {
            retained.push(file.path.clone());
        }
    }
    (retained, candidates)
}
