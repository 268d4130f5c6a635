use dupefind::duplicates::{Diagnostic, DuplicateFinder, FinderConfig};
use dupefind::scanner::{Digest, DigestAlgorithm, DigestError, Digester, FileEntry};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::{tempdir, TempDir};

/// Forces a digest collision: every file of the same size gets the same digest.
struct CollidingDigester;

impl Digester for CollidingDigester {
    fn algorithm(&self) -> DigestAlgorithm {
        DigestAlgorithm::Md5
    }

    fn digest(&self, _path: &Path, expected_size: u64) -> Result<Digest, DigestError> {
        let mut bytes = [0u8; 16];
        bytes[..8].copy_from_slice(&expected_size.to_le_bytes());
        Ok(Digest::new(DigestAlgorithm::Md5, bytes))
    }
}

fn entry(dir: &TempDir, name: &str, content: &[u8]) -> FileEntry {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    FileEntry::from_path(&path).unwrap()
}

fn colliding_finder(verify: bool) -> DuplicateFinder {
    DuplicateFinder::with_digester(
        FinderConfig::default().with_verify(verify),
        Arc::new(CollidingDigester),
    )
}

#[test]
fn test_scenario_c_collision_rejected_when_verifying() {
    let dir = tempdir().unwrap();
    let files = vec![entry(&dir, "x.bin", b"AAAA"), entry(&dir, "y.bin", b"BBBB")];

    let (set, summary) = colliding_finder(true)
        .find_duplicates_from_files(files)
        .unwrap();

    assert!(set.is_empty());
    assert!(set.verified);
    assert_eq!(summary.collisions_rejected, 1);
    assert_eq!(
        set.diagnostics,
        vec![Diagnostic::CollisionRejected {
            path: dir.path().join("y.bin"),
            anchor: dir.path().join("x.bin"),
        }]
    );
    // A rejected collision is not an error exclusion.
    assert_eq!(summary.excluded_files, 0);
    assert_eq!(summary.unique_files, 2);
}

#[test]
fn test_scenario_c_collision_accepted_without_verification() {
    let dir = tempdir().unwrap();
    let files = vec![entry(&dir, "x.bin", b"AAAA"), entry(&dir, "y.bin", b"BBBB")];

    let (set, summary) = colliding_finder(false)
        .find_duplicates_from_files(files)
        .unwrap();

    assert_eq!(set.len(), 1);
    assert!(!set.verified);
    assert_eq!(set.groups[0].len(), 2);
    assert_eq!(summary.collisions_rejected, 0);
}

#[test]
fn test_collision_removes_only_the_odd_member() {
    let dir = tempdir().unwrap();
    let files = vec![
        entry(&dir, "x.bin", b"same"),
        entry(&dir, "y.bin", b"diff"),
        entry(&dir, "z.bin", b"same"),
    ];

    let (set, summary) = colliding_finder(true)
        .find_duplicates_from_files(files)
        .unwrap();

    assert_eq!(set.len(), 1);
    assert_eq!(
        set.groups[0].paths(),
        vec![dir.path().join("x.bin"), dir.path().join("z.bin")]
    );
    assert_eq!(summary.collisions_rejected, 1);
    assert_eq!(summary.unique_files, 1);
}

#[test]
fn test_verification_keeps_real_duplicates() {
    let dir = tempdir().unwrap();
    entry(&dir, "one", b"identical bytes");
    entry(&dir, "two", b"identical bytes");

    let finder = DuplicateFinder::new(FinderConfig::default().with_verify(true));
    let (set, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(set.len(), 1);
    assert!(set.verified && summary.verified);
    assert!(set.diagnostics.is_empty());
}
