use dupefind::actions::{
    DeleteConfig, DispositionEngine, DispositionError, DispositionPolicy, SelectionSource,
    TerminalPrompt,
};
use dupefind::duplicates::{DuplicateFinder, DuplicateGroup, FinderConfig};
use dupefind::scanner::{FileEntry, WalkerConfig};
use std::fs;
use std::io::Cursor;
use tempfile::{tempdir, TempDir};

fn scenario_a() -> TempDir {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "hello").unwrap();
    fs::write(dir.path().join("b.txt"), "hello").unwrap();
    fs::write(dir.path().join("c.txt"), "world").unwrap();
    dir
}

/// Records the groups it was asked about and always picks the last member.
#[derive(Default)]
struct PickLast {
    asked: Vec<usize>,
}

impl SelectionSource for PickLast {
    fn select(&mut self, group_index: usize, group: &DuplicateGroup) -> Vec<usize> {
        self.asked.push(group_index);
        vec![group.len() - 1]
    }
}

#[test]
fn test_scenario_d_automatic_disposition() {
    let dir = scenario_a();
    let (set, _) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    let report = DispositionEngine::default()
        .apply(&set, DispositionPolicy::Automatic, None)
        .unwrap();

    assert!(dir.path().join("a.txt").exists());
    assert!(!dir.path().join("b.txt").exists());
    assert!(dir.path().join("c.txt").exists());
    assert_eq!(report.removed_count(), 1);
    assert_eq!(report.bytes_freed(), 5);
}

#[test]
fn test_report_only_is_idempotent() {
    let dir = scenario_a();
    let finder = DuplicateFinder::with_defaults();
    let (first, _) = finder.find_duplicates(dir.path()).unwrap();

    let report = DispositionEngine::default()
        .apply(&first, DispositionPolicy::ReportOnly, None)
        .unwrap();
    let (second, _) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(first, second);
    assert_eq!(report.removed_count(), 0);
    assert_eq!(report.groups[0].candidates, vec![dir.path().join("b.txt")]);
}

#[test]
fn test_interactive_with_injected_source() {
    let dir = scenario_a();
    fs::write(dir.path().join("d.txt"), "world").unwrap();
    let (set, _) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    let mut source = PickLast::default();
    let report = DispositionEngine::default()
        .apply(&set, DispositionPolicy::Interactive, Some(&mut source))
        .unwrap();

    assert_eq!(source.asked, vec![0, 1]);
    assert!(dir.path().join("a.txt").exists());
    assert!(!dir.path().join("b.txt").exists());
    assert!(dir.path().join("c.txt").exists());
    assert!(!dir.path().join("d.txt").exists());
    assert_eq!(report.removed_count(), 2);
}

#[test]
fn test_interactive_terminal_prompt() {
    let dir = scenario_a();
    let (set, _) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    let mut out = Vec::new();
    let mut prompt = TerminalPrompt::new(Cursor::new("1\n"), &mut out, set.len());
    let report = DispositionEngine::default()
        .apply(&set, DispositionPolicy::Interactive, Some(&mut prompt))
        .unwrap();

    assert!(!dir.path().join("a.txt").exists());
    assert!(dir.path().join("b.txt").exists());
    assert_eq!(report.groups[0].retained, vec![dir.path().join("b.txt")]);
}

#[test]
fn test_interactive_cannot_delete_every_copy() {
    let dir = scenario_a();
    let (set, _) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    let mut prompt = TerminalPrompt::new(Cursor::new("1-2\n"), Vec::new(), set.len());
    let report = DispositionEngine::default()
        .apply(&set, DispositionPolicy::Interactive, Some(&mut prompt))
        .unwrap();

    assert!(dir.path().join("a.txt").exists());
    assert!(dir.path().join("b.txt").exists());
    assert!(report.groups[0].selection_rejected);
}

#[test]
fn test_dry_run_leaves_files_in_place() {
    let dir = scenario_a();
    let (set, _) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    let engine = DispositionEngine::new(DeleteConfig::default().with_dry_run(true));
    let report = engine.apply(&set, DispositionPolicy::Automatic, None).unwrap();

    assert!(dir.path().join("b.txt").exists());
    assert_eq!(report.removed_count(), 1);
    assert!(report.dry_run);
}

#[test]
fn test_deletion_failure_does_not_stop_other_groups() {
    let dir = scenario_a();
    fs::write(dir.path().join("d.txt"), "world").unwrap();
    let (set, _) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    fs::remove_file(dir.path().join("b.txt")).unwrap();

    let report = DispositionEngine::default()
        .apply(&set, DispositionPolicy::Automatic, None)
        .unwrap();

    assert_eq!(report.failure_count(), 1);
    assert_eq!(report.removed_count(), 1);
    assert!(!dir.path().join("d.txt").exists());
}

#[test]
fn test_conflicting_flags_rejected() {
    assert_eq!(
        DispositionPolicy::from_flags(true, true),
        Err(DispositionError::ConflictingPolicy)
    );
}

#[cfg(unix)]
#[test]
fn test_followed_symlink_never_costs_the_real_file() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("b_real.txt"), "hello").unwrap();
    std::os::unix::fs::symlink(dir.path().join("b_real.txt"), dir.path().join("a_link.txt"))
        .unwrap();

    let config = FinderConfig::default().with_walker_config(WalkerConfig::new(true, false, vec![]));
    let (set, summary) = DuplicateFinder::new(config)
        .find_duplicates(dir.path())
        .unwrap();

    assert!(set.is_empty());
    assert_eq!(summary.reclaimable_space, 0);

    DispositionEngine::default()
        .apply(&set, DispositionPolicy::Automatic, None)
        .unwrap();
    assert_eq!(fs::read_to_string(dir.path().join("a_link.txt")).unwrap(), "hello");
    assert!(dir.path().join("b_real.txt").exists());
}

#[cfg(unix)]
#[test]
fn test_link_and_target_handed_in_directly_are_both_kept() {
    let dir = tempdir().unwrap();
    let real = dir.path().join("b_real.txt");
    let link = dir.path().join("a_link.txt");
    fs::write(&real, "hello").unwrap();
    std::os::unix::fs::symlink(&real, &link).unwrap();

    // The caller-supplied stream bypasses the walker's same-file filter.
    let files = vec![
        FileEntry::from_path(&link).unwrap(),
        FileEntry::from_path(&real).unwrap(),
    ];
    let (set, _) = DuplicateFinder::with_defaults()
        .find_duplicates_from_files(files)
        .unwrap();
    assert_eq!(set.len(), 1);

    let report = DispositionEngine::default()
        .apply(&set, DispositionPolicy::Automatic, None)
        .unwrap();

    assert_eq!(report.removed_count(), 0);
    assert_eq!(report.failure_count(), 1);
    assert!(report.groups[0].failures[0].reason.contains("same file"));
    assert_eq!(fs::read_to_string(&link).unwrap(), "hello");
}

#[cfg(unix)]
#[test]
fn test_hard_links_are_not_reported_as_duplicates() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "hello").unwrap();
    fs::hard_link(dir.path().join("a.txt"), dir.path().join("b.txt")).unwrap();

    let (set, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert!(set.is_empty());
    assert_eq!(summary.reclaimable_space, 0);
    assert_eq!(summary.total_files, 1);
}
