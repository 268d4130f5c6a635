use dupefind::duplicates::{Diagnostic, DuplicateFinder};
use dupefind::scanner::FileEntry;
use std::fs;
use std::path::PathBuf;
use std::time::SystemTime;
use tempfile::tempdir;

#[test]
fn test_unreadable_files_are_excluded_not_fatal() {
    let finder = DuplicateFinder::with_defaults();
    let file1 = FileEntry::new(PathBuf::from("nonexistent_1.txt"), 100, SystemTime::now());
    let file2 = FileEntry::new(PathBuf::from("nonexistent_2.txt"), 100, SystemTime::now());

    let (set, summary) = finder
        .find_duplicates_from_files(vec![file1, file2])
        .unwrap();

    assert!(set.is_empty());
    assert_eq!(set.diagnostics.len(), 2);
    for diagnostic in &set.diagnostics {
        assert!(
            matches!(diagnostic, Diagnostic::UnreadableFile { .. }),
            "unexpected diagnostic: {diagnostic:?}"
        );
    }
    assert_eq!(summary.excluded_files, 2);
    assert_eq!(summary.unique_files, 0);
}

#[test]
fn test_unreadable_member_does_not_break_its_group() {
    let dir = tempdir().unwrap();
    let mut files = Vec::new();
    for name in ["one", "two"] {
        let path = dir.path().join(name);
        fs::write(&path, b"12345").unwrap();
        files.push(FileEntry::from_path(&path).unwrap());
    }
    files.push(FileEntry::new(dir.path().join("gone"), 5, SystemTime::now()));

    let (set, summary) = DuplicateFinder::with_defaults()
        .find_duplicates_from_files(files)
        .unwrap();

    assert_eq!(set.len(), 1);
    assert_eq!(set.groups[0].len(), 2);
    assert_eq!(set.diagnostics.len(), 1);
    assert_eq!(set.diagnostics[0].path(), dir.path().join("gone"));
    assert_eq!(summary.excluded_files, 1);
    assert_eq!(summary.unique_files, 0);
}

#[test]
fn test_file_that_shrank_is_reported_as_truncated() {
    let dir = tempdir().unwrap();
    let full = dir.path().join("full");
    let shrunk = dir.path().join("shrunk");
    fs::write(&full, b"0123456789").unwrap();
    fs::write(&shrunk, b"0123").unwrap();

    let files = vec![
        FileEntry::from_path(&full).unwrap(),
        // Size recorded before the file was truncated.
        FileEntry::new(shrunk.clone(), 10, SystemTime::now()),
    ];

    let (set, summary) = DuplicateFinder::with_defaults()
        .find_duplicates_from_files(files)
        .unwrap();

    assert!(set.is_empty());
    assert_eq!(
        set.diagnostics,
        vec![Diagnostic::TruncatedRead {
            path: shrunk,
            expected: 10,
            actual: 4,
        }]
    );
    assert_eq!(summary.excluded_files, 1);
    assert_eq!(summary.unique_files, 1);
}

#[test]
fn test_diagnostics_serialize_with_kind_tag() {
    let diagnostic = Diagnostic::UnreadableFile {
        path: PathBuf::from("/locked"),
        reason: "permission denied".to_string(),
    };
    let json = serde_json::to_value(&diagnostic).unwrap();
    assert_eq!(json["kind"], "unreadable_file");
    assert_eq!(json["reason"], "permission denied");
}
