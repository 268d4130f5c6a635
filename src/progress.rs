//! Progress reporting using indicatif.
//!
//! The pipeline reports through the [`ProgressCallback`] trait. [`Progress`]
//! renders it as terminal bars: a spinner while walking, then one bar each
//! for digesting and verification.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use bytesize::ByteSize;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Phase name used while walking the directory tree.
pub const PHASE_WALKING: &str = "walking";
/// Phase name used while digesting candidate files.
pub const PHASE_DIGEST: &str = "digest";
/// Phase name used while byte-comparing groups.
pub const PHASE_VERIFY: &str = "verify";

/// Progress callback for duplicate finding phases.
///
/// Implement this trait to receive progress updates during
/// the duplicate detection pipeline.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts.
    ///
    /// # Arguments
    ///
    /// * `phase` - Name of the phase ("walking", "digest", "verify")
    /// * `total` - Total number of items to process (0 if unknown)
    fn on_phase_start(&self, phase: &str, total: usize);

    /// Called for each item processed.
    ///
    /// # Arguments
    ///
    /// * `current` - Current item number (1-based)
    /// * `path` - Path being processed
    fn on_progress(&self, current: usize, path: &str);

    /// Called when an item has been processed, providing its size.
    fn on_item_completed(&self, _bytes: u64) {}

    /// Called when a phase completes.
    fn on_phase_end(&self, phase: &str);

    /// Called to update the progress message.
    fn on_message(&self, _message: &str) {}
}

/// Progress reporter using indicatif.
pub struct Progress {
    multi: MultiProgress,
    active: Mutex<Option<ProgressBar>>,
    bytes: AtomicU64,
    quiet: bool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Progress {
    /// Create a new progress reporter drawing to stderr.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, no progress bars will be displayed.
    ///
    /// # Examples
    ///
    /// ```
    /// use dupefind::progress::Progress;
    ///
    /// let progress = Progress::new(true);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        let multi = if quiet {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        } else {
            MultiProgress::new()
        };
        Self {
            multi,
            active: Mutex::new(None),
            bytes: AtomicU64::new(0),
            quiet,
        }
    }

    /// Bytes reported through [`ProgressCallback::on_item_completed`].
    #[must_use]
    pub fn bytes_processed(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }

    fn walking_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}] {pos} files")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    fn digest_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.green/blue}] {pos}/{len} ({percent}%) {prefix} {msg} (ETA: {eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }

    fn verify_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} groups {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        if phase == PHASE_DIGEST {
            self.bytes.store(0, Ordering::Relaxed);
        }
        if self.quiet {
            return;
        }

        let pb = match phase {
            PHASE_WALKING => {
                let pb = self.multi.add(ProgressBar::new_spinner());
                pb.set_style(Self::walking_style());
                pb.set_message("Walking directory");
                pb.enable_steady_tick(Duration::from_millis(100));
                pb
            }
            PHASE_DIGEST => {
                let pb = self.multi.add(ProgressBar::new(total as u64));
                pb.set_style(Self::digest_style());
                pb.set_message("Digesting");
                pb
            }
            PHASE_VERIFY => {
                let pb = self.multi.add(ProgressBar::new(total as u64));
                pb.set_style(Self::verify_style());
                pb.set_message("Verifying");
                pb
            }
            other => {
                let pb = self.multi.add(ProgressBar::new(total as u64));
                pb.set_style(Self::verify_style());
                pb.set_message(other.to_string());
                pb
            }
        };

        if let Some(previous) = lock(&self.active).replace(pb) {
            previous.finish_and_clear();
        }
    }

    fn on_progress(&self, current: usize, path: &str) {
        if self.quiet {
            return;
        }
        if let Some(ref pb) = *lock(&self.active) {
            pb.set_position(current as u64);
            pb.set_message(truncate_path(path, 30));
        }
    }

    fn on_item_completed(&self, bytes: u64) {
        let total = self.bytes.fetch_add(bytes, Ordering::Relaxed) + bytes;
        if self.quiet {
            return;
        }
        if let Some(ref pb) = *lock(&self.active) {
            pb.set_prefix(ByteSize(total).to_string());
        }
    }

    fn on_phase_end(&self, phase: &str) {
        if self.quiet {
            return;
        }
        if let Some(pb) = lock(&self.active).take() {
            let message = match phase {
                PHASE_WALKING => "Walking complete".to_string(),
                PHASE_DIGEST => format!("Digesting complete, {} read", ByteSize(self.bytes_processed())),
                PHASE_VERIFY => "Verification complete".to_string(),
                other => format!("{other} complete"),
            };
            pb.finish_with_message(message);
        }
    }

    fn on_message(&self, message: &str) {
        if self.quiet {
            return;
        }
        if let Some(ref pb) = *lock(&self.active) {
            pb.set_message(message.to_string());
        }
    }
}

/// Truncate a path for display in the progress bar.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }

    let file_name = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let name_len = file_name.chars().count();
    if name_len + 4 > max_len {
        let tail: String = file_name
            .chars()
            .skip(name_len.saturating_sub(max_len.saturating_sub(3)))
            .collect();
        return format!("...{tail}");
    }

    format!(".../{file_name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_path_unchanged() {
        assert_eq!(truncate_path("/a/b.txt", 30), "/a/b.txt");
    }

    #[test]
    fn test_truncate_long_path_keeps_file_name() {
        let path = "/very/long/directory/structure/that/goes/on/file.txt";
        assert_eq!(truncate_path(path, 30), ".../file.txt");
    }

    #[test]
    fn test_truncate_long_file_name() {
        let name = "x".repeat(50);
        let truncated = truncate_path(&format!("/dir/{name}"), 30);
        assert_eq!(truncated.chars().count(), 30);
        assert!(truncated.starts_with("..."));
    }

    #[test]
    fn test_truncate_multibyte_name() {
        let name = "é".repeat(40);
        let truncated = truncate_path(&format!("/dir/{name}"), 10);
        assert_eq!(truncated, format!("...{}", "é".repeat(7)));
    }

    #[test]
    fn test_quiet_progress_counts_bytes() {
        let progress = Progress::new(true);
        progress.on_phase_start(PHASE_DIGEST, 2);
        progress.on_item_completed(100);
        progress.on_item_completed(28);
        progress.on_phase_end(PHASE_DIGEST);
        assert_eq!(progress.bytes_processed(), 128);
    }

    #[test]
    fn test_visible_progress_phase_cycle() {
        let progress = Progress::new(false);
        progress.on_phase_start(PHASE_WALKING, 0);
        progress.on_progress(1, "/tmp/a");
        progress.on_phase_end(PHASE_WALKING);
        progress.on_phase_start(PHASE_VERIFY, 3);
        progress.on_message("checking");
        progress.on_phase_end(PHASE_VERIFY);
        assert!(lock(&progress.active).is_none());
    }
}
