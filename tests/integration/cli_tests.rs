use clap::Parser;
use dupefind::cli::Cli;
use dupefind::error::ExitCode;
use dupefind::run_app;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

/// Scenario A plus an empty config file outside the scanned tree, so the
/// user's real config never leaks into the run.
struct Fixture {
    root: TempDir,
    config: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let root = tempdir().unwrap();
        fs::write(root.path().join("a.txt"), "hello").unwrap();
        fs::write(root.path().join("b.txt"), "hello").unwrap();
        fs::write(root.path().join("c.txt"), "world").unwrap();

        let config = tempdir().unwrap();
        fs::write(config.path().join("config.toml"), "").unwrap();
        Self { root, config }
    }

    fn path(&self, name: &str) -> String {
        self.root.path().join(name).to_string_lossy().into_owned()
    }

    fn run(&self, args: &[&str]) -> anyhow::Result<ExitCode> {
        let config = self.config.path().join("config.toml");
        let mut argv = vec![
            "dupefind".to_string(),
            "-q".to_string(),
            "--config".to_string(),
            config.to_string_lossy().into_owned(),
        ];
        argv.extend(args.iter().map(|s| s.to_string()));
        run_app(Cli::try_parse_from(argv)?)
    }
}

#[test]
fn test_scan_with_duplicates_exits_success() {
    let fx = Fixture::new();
    let code = fx
        .run(&["scan", &fx.path(""), "--no-progress", "--output", "json"])
        .unwrap();
    assert_eq!(code, ExitCode::Success);
}

#[test]
fn test_scan_without_duplicates_exits_no_duplicates() {
    let fx = Fixture::new();
    fs::remove_file(fx.root.path().join("b.txt")).unwrap();

    let code = fx.run(&["scan", &fx.path(""), "--no-progress"]).unwrap();
    assert_eq!(code, ExitCode::NoDuplicates);
}

#[test]
fn test_min_size_applies_from_cli() {
    let fx = Fixture::new();
    let code = fx
        .run(&["scan", &fx.path(""), "--no-progress", "--min-size", "10", "-o", "csv"])
        .unwrap();
    assert_eq!(code, ExitCode::NoDuplicates);
}

#[test]
fn test_missing_root_is_invalid_input() {
    let fx = Fixture::new();
    let err = fx
        .run(&["scan", &fx.path("missing"), "--no-progress"])
        .unwrap_err();
    assert_eq!(ExitCode::from_error(&err), ExitCode::InvalidInput);
}

#[test]
fn test_conflicting_policy_rejected_before_scanning() {
    let fx = Fixture::new();
    let err = fx
        .run(&["scan", &fx.path(""), "--interactive", "--auto"])
        .unwrap_err();

    assert_eq!(ExitCode::from_error(&err), ExitCode::ConflictingPolicy);
    assert!(Path::new(&fx.path("b.txt")).exists());
}

#[test]
fn test_auto_deletes_redundant_copy() {
    let fx = Fixture::new();
    let code = fx
        .run(&["scan", &fx.path(""), "--no-progress", "--auto"])
        .unwrap();

    assert_eq!(code, ExitCode::Success);
    assert!(Path::new(&fx.path("a.txt")).exists());
    assert!(!Path::new(&fx.path("b.txt")).exists());
    assert!(Path::new(&fx.path("c.txt")).exists());
}

#[test]
fn test_auto_dry_run_keeps_files() {
    let fx = Fixture::new();
    fx.run(&["scan", &fx.path(""), "--no-progress", "--auto", "--dry-run"])
        .unwrap();
    assert!(Path::new(&fx.path("b.txt")).exists());
}

#[test]
fn test_missing_config_file_is_invalid_input() {
    let argv = [
        "dupefind",
        "-q",
        "--config",
        "/definitely/not/here.toml",
        "scan",
        "/tmp",
    ];
    let err = run_app(Cli::try_parse_from(argv).unwrap()).unwrap_err();
    assert_eq!(ExitCode::from_error(&err), ExitCode::InvalidInput);
}

#[test]
fn test_digest_subcommand() {
    let fx = Fixture::new();
    let code = fx
        .run(&["digest", "-a", "sha1", &fx.path("a.txt"), &fx.path("c.txt")])
        .unwrap();
    assert_eq!(code, ExitCode::Success);

    let code = fx.run(&["digest", &fx.path("missing.txt")]).unwrap();
    assert_eq!(code, ExitCode::GeneralError);
}
