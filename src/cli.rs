//! Command-line interface definitions for dupefind.
//!
//! Global options (verbosity, color, config file) come first, followed by a
//! subcommand.
//!
//! # Example
//!
//! ```bash
//! # Report duplicates under ~/Downloads
//! dupefind scan ~/Downloads
//!
//! # SHA-1 digests, byte-level confirmation, JSON output
//! dupefind scan ~/Downloads --algorithm sha1 --verify --output json
//!
//! # Keep the first copy of every group, move the rest to the trash
//! dupefind scan ~/Downloads --auto --trash
//!
//! # Print digests of individual files
//! dupefind digest --algorithm md5 a.bin b.bin
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::output::OutputFormat;
use crate::scanner::DigestAlgorithm;

/// Content-addressable duplicate file finder.
///
/// Files are bucketed by size, digested only when they share a size, and
/// optionally confirmed byte-for-byte before anything is reported or removed.
#[derive(Debug, Parser)]
#[command(name = "dupefind")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Print fatal errors as a JSON object on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan a directory tree for duplicate files
    Scan(ScanArgs),
    /// Print the digest of individual files
    Digest(DigestArgs),
}

/// Arguments for the scan subcommand.
///
/// Options left unset fall back to the configuration file and `DUPEFIND_*`
/// environment variables.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Directory to scan
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Digest algorithm: md5, sha1, blake3 or sha512 (or the bit width)
    #[arg(short, long, value_name = "ALGORITHM")]
    pub algorithm: Option<DigestAlgorithm>,

    /// Minimum file size to consider (e.g., 1KB, 1MB, 1GB)
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub min_size: Option<u64>,

    /// Confirm every group byte-for-byte before reporting it
    #[arg(long, overrides_with = "no_verify")]
    pub verify: bool,

    /// Skip byte-for-byte confirmation even if the config enables it
    #[arg(long, overrides_with = "verify")]
    pub no_verify: bool,

    /// Ask which members of each group to delete
    #[arg(short, long)]
    pub interactive: bool,

    /// Keep the first member of each group and delete the rest
    #[arg(long)]
    pub auto: bool,

    /// Show what would be deleted without deleting anything
    #[arg(long)]
    pub dry_run: bool,

    /// Move deleted files to the system trash instead of removing them
    #[arg(long)]
    pub trash: bool,

    /// Output format
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Gitignore-style patterns to skip (can be specified multiple times)
    ///
    /// These patterns are added to any .gitignore found at the root.
    #[arg(long = "ignore", value_name = "PATTERN")]
    pub ignore_patterns: Vec<String>,

    /// Skip hidden files and directories (names starting with '.')
    #[arg(long, overrides_with = "no_skip_hidden")]
    pub skip_hidden: bool,

    /// Include hidden files even if the config skips them
    #[arg(long, overrides_with = "skip_hidden")]
    pub no_skip_hidden: bool,

    /// Follow symbolic links during the scan
    #[arg(long, overrides_with = "no_follow_symlinks")]
    pub follow_symlinks: bool,

    /// Do not follow symbolic links even if the config enables it
    #[arg(long, overrides_with = "follow_symlinks")]
    pub no_follow_symlinks: bool,

    /// Number of threads used for digesting and verification
    #[arg(long, value_name = "N")]
    pub io_threads: Option<usize>,

    /// Hide progress bars
    #[arg(long)]
    pub no_progress: bool,
}

impl ScanArgs {
    /// `--verify` / `--no-verify`, or `None` when neither was given.
    #[must_use]
    pub fn verify_flag(&self) -> Option<bool> {
        switch(self.verify, self.no_verify)
    }

    /// `--skip-hidden` / `--no-skip-hidden`, or `None` when neither was given.
    #[must_use]
    pub fn skip_hidden_flag(&self) -> Option<bool> {
        switch(self.skip_hidden, self.no_skip_hidden)
    }

    /// `--follow-symlinks` / `--no-follow-symlinks`, or `None` when neither was given.
    #[must_use]
    pub fn follow_symlinks_flag(&self) -> Option<bool> {
        switch(self.follow_symlinks, self.no_follow_symlinks)
    }
}

// The pairs override each other, so at most one side is set.
fn switch(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (false, true) => Some(false),
        (false, false) => None,
    }
}

/// Arguments for the digest subcommand.
#[derive(Debug, Args)]
pub struct DigestArgs {
    /// Files to digest
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,

    /// Digest algorithm: md5, sha1, blake3 or sha512 (or the bit width)
    #[arg(short, long, value_name = "ALGORITHM")]
    pub algorithm: Option<DigestAlgorithm>,
}

/// Parse a human-readable size string into bytes.
///
/// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
/// Case-insensitive. Numbers without suffix are treated as bytes.
///
/// # Examples
///
/// ```
/// use dupefind::cli::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("1KB").unwrap(), 1000);
/// assert_eq!(parse_size("1KiB").unwrap(), 1024);
/// assert_eq!(parse_size("1MiB").unwrap(), 1_048_576);
/// ```
/// # Errors
///
/// Returns an error if the string is empty, contains an invalid number,
/// a negative number, or an unknown size suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }
    if s.starts_with('-') {
        return Err("Size cannot be negative".to_string());
    }

    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1_024,
        "MB" | "M" => 1_000_000,
        "MIB" => 1_048_576,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1_073_741_824,
        "TB" | "T" => 1_000_000_000_000,
        "TIB" => 1_099_511_627_776,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((num * multiplier as f64) as u64)
}
