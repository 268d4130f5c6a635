use dupefind::duplicates::{DuplicateFinder, DuplicateSet, FinderConfig, FinderError};
use dupefind::scanner::{DigestAlgorithm, WalkerConfig};
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

fn write(dir: &TempDir, name: &str, content: &[u8]) {
    let path = dir.path().join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn names(set: &DuplicateSet, root: &Path) -> Vec<Vec<String>> {
    set.groups
        .iter()
        .map(|g| {
            g.files
                .iter()
                .map(|f| {
                    f.path
                        .strip_prefix(root)
                        .unwrap()
                        .to_string_lossy()
                        .replace('\\', "/")
                })
                .collect()
        })
        .collect()
}

/// a.txt and b.txt hold "hello", c.txt holds "world".
fn scenario_a() -> TempDir {
    let dir = tempdir().unwrap();
    write(&dir, "a.txt", b"hello");
    write(&dir, "b.txt", b"hello");
    write(&dir, "c.txt", b"world");
    dir
}

#[test]
fn test_scenario_a_one_group_one_unique() {
    let dir = scenario_a();
    let finder = DuplicateFinder::new(FinderConfig::default().with_min_size(0));

    let (set, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(names(&set, dir.path()), vec![vec!["a.txt", "b.txt"]]);
    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.unique_files, 1);
    assert_eq!(summary.excluded_files, 0);
    assert_eq!(summary.duplicate_groups, 1);
    assert_eq!(summary.duplicate_files, 1);
    assert_eq!(summary.reclaimable_space, 5);
    assert!(set.diagnostics.is_empty());
}

#[test]
fn test_scenario_b_everything_below_min_size() {
    let dir = scenario_a();
    let finder = DuplicateFinder::new(FinderConfig::default().with_min_size(10));

    let (set, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert!(set.is_empty());
    assert_eq!(summary.below_min_size, 3);
    assert_eq!(summary.unique_files, 0);
    assert_eq!(summary.bytes_hashed, 0);
}

#[test]
fn test_every_algorithm_agrees_on_grouping() {
    let dir = scenario_a();
    write(&dir, "sub/d.txt", b"world");

    for algorithm in DigestAlgorithm::ALL {
        let finder = DuplicateFinder::new(FinderConfig::default().with_algorithm(algorithm));
        let (set, summary) = finder.find_duplicates(dir.path()).unwrap();

        assert_eq!(
            names(&set, dir.path()),
            vec![vec!["a.txt", "b.txt"], vec!["c.txt", "sub/d.txt"]],
            "grouping differs for {algorithm}"
        );
        assert_eq!(summary.algorithm, algorithm);
        for group in &set.groups {
            assert_eq!(group.digest.algorithm(), algorithm);
            assert_eq!(group.digest.as_bytes().len(), algorithm.output_len());
        }
    }
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let (set, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert!(set.is_empty());
    assert_eq!(summary.total_files, 0);
}

#[test]
fn test_same_size_different_content_not_grouped() {
    let dir = tempdir().unwrap();
    write(&dir, "one", b"aaaa");
    write(&dir, "two", b"bbbb");
    write(&dir, "three", b"cccc");

    let (set, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert!(set.is_empty());
    assert_eq!(summary.unique_files, 3);
    assert_eq!(summary.bytes_hashed, 12);
}

#[test]
fn test_groups_follow_discovery_order() {
    let dir = tempdir().unwrap();
    write(&dir, "a/late_1", b"second group content");
    write(&dir, "b/early", b"first");
    write(&dir, "c/late_2", b"second group content");
    write(&dir, "d/early", b"first");

    let (set, _) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(
        names(&set, dir.path()),
        vec![vec!["a/late_1", "c/late_2"], vec!["b/early", "d/early"]]
    );
}

#[test]
fn test_empty_files_form_a_group() {
    let dir = tempdir().unwrap();
    write(&dir, "empty1", b"");
    write(&dir, "empty2", b"");

    let (set, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(set.len(), 1);
    assert_eq!(set.groups[0].size, 0);
    assert_eq!(summary.reclaimable_space, 0);
}

#[test]
fn test_walker_filters_apply_before_grouping() {
    let dir = scenario_a();
    write(&dir, ".hidden/copy.txt", b"hello");
    write(&dir, "build/copy.txt", b"hello");
    write(&dir, "notes.tmp", b"hello");

    let walker = WalkerConfig::new(false, true, vec!["build/".to_string(), "*.tmp".to_string()]);
    let finder = DuplicateFinder::new(FinderConfig::default().with_walker_config(walker));
    let (set, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(names(&set, dir.path()), vec![vec!["a.txt", "b.txt"]]);
    assert_eq!(summary.total_files, 3);
}

#[test]
fn test_rejects_missing_root() {
    let dir = tempdir().unwrap();
    let result = DuplicateFinder::with_defaults().find_duplicates(&dir.path().join("missing"));
    assert!(matches!(result, Err(FinderError::PathNotFound(_))));
}

#[test]
fn test_rejects_file_root() {
    let dir = scenario_a();
    let result = DuplicateFinder::with_defaults().find_duplicates(&dir.path().join("a.txt"));
    assert!(matches!(result, Err(FinderError::NotADirectory(_))));
}

#[test]
fn test_repeated_scans_are_identical() {
    let dir = scenario_a();
    let finder = DuplicateFinder::with_defaults();

    let (first, _) = finder.find_duplicates(dir.path()).unwrap();
    let (second, _) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(first, second);
}
