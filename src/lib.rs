//! dupefind - content-addressable duplicate file finder
//!
//! Files are bucketed by exact size, only same-size files are digested
//! (MD5, SHA-1, BLAKE3 or SHA-512), equal digests form duplicate groups,
//! and groups can optionally be confirmed byte-for-byte. The resulting
//! [`duplicates::DuplicateSet`] can be reported, or handed to the
//! [`actions::DispositionEngine`] to delete redundant copies.

pub mod actions;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::fs;
use std::io::{self, IsTerminal, Write};
use std::sync::Arc;

use anyhow::Context;

use crate::actions::{
    DeleteConfig, DispositionEngine, DispositionPolicy, DispositionReport, SelectionSource,
    TerminalPrompt,
};
use crate::cli::{Cli, Commands, DigestArgs, ScanArgs};
use crate::config::Config;
use crate::duplicates::DuplicateFinder;
use crate::error::ExitCode;
use crate::progress::Progress;
use crate::scanner::{Digester, Hasher};

/// Run the application for parsed command-line arguments.
///
/// # Errors
///
/// Returns an error for fatal conditions: invalid configuration, a missing
/// or non-directory scan root, conflicting disposition flags, interruption,
/// or failure to write output. Map it with [`ExitCode::from_error`].
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    if cli.no_color || !io::stdout().is_terminal() {
        yansi::disable();
    }

    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    log::debug!("Effective configuration: {:?}", config);

    match cli.command {
        Commands::Scan(args) => run_scan(&args, config, cli.quiet),
        Commands::Digest(args) => run_digest(&args, &config),
    }
}

fn run_scan(args: &ScanArgs, config: Config, quiet: bool) -> anyhow::Result<ExitCode> {
    // Rejected before any filesystem work.
    let policy = DispositionPolicy::from_flags(args.interactive, args.auto)?;
    let config = config.with_scan_args(args);

    let handler = signal::install_handler()?;
    let progress = Arc::new(Progress::new(quiet || args.no_progress));
    let finder_config = config
        .finder_config()
        .with_shutdown_flag(handler.get_flag())
        .with_progress_callback(progress);

    let finder = DuplicateFinder::new(finder_config);
    let (set, summary) = finder
        .find_duplicates(&args.path)
        .with_context(|| format!("failed to scan {}", args.path.display()))?;

    for diagnostic in &set.diagnostics {
        log::warn!("{}", diagnostic);
    }

    let stdout = io::stdout();
    output::render(config.output, &set, &summary, stdout.lock())
        .context("failed to write results")?;

    if policy.mutates() && !set.is_empty() {
        let delete_config = DeleteConfig::default()
            .with_removal(config.removal)
            .with_dry_run(args.dry_run);
        let engine = DispositionEngine::new(delete_config).with_shutdown_flag(handler.get_flag());

        let report = if policy == DispositionPolicy::Interactive {
            let stdin = io::stdin();
            let mut prompt = TerminalPrompt::new(stdin.lock(), io::stderr(), set.len());
            engine.apply(&set, policy, Some(&mut prompt as &mut dyn SelectionSource))?
        } else {
            engine.apply(&set, policy, None)?
        };

        if !quiet {
            print_disposition(&report).context("failed to write disposition report")?;
        }
        if report.interrupted {
            return Ok(ExitCode::Interrupted);
        }
    }

    if set.is_empty() {
        Ok(ExitCode::NoDuplicates)
    } else {
        Ok(ExitCode::Success)
    }
}

fn print_disposition(report: &DispositionReport) -> io::Result<()> {
    let mut err = io::stderr().lock();
    let verb = if report.dry_run { "would delete" } else { "deleted" };
    for group in &report.groups {
        for removed in &group.removed {
            writeln!(err, "{} ({}): {}", verb, removed.mode, removed.path.display())?;
        }
        for failure in &group.failures {
            writeln!(err, "failed: {}: {}", failure.path.display(), failure.reason)?;
        }
    }
    writeln!(err, "{}", report.summary())
}

fn run_digest(args: &DigestArgs, config: &Config) -> anyhow::Result<ExitCode> {
    let algorithm = args.algorithm.unwrap_or(config.algorithm);
    let hasher = Hasher::new(algorithm);
    let mut out = io::stdout().lock();
    let mut failed = 0usize;

    for path in &args.files {
        let digest = fs::metadata(path)
            .map_err(anyhow::Error::from)
            .and_then(|meta| Ok(hasher.digest(path, meta.len())?));
        match digest {
            Ok(digest) => writeln!(out, "{}  {}", digest.to_hex(), path.display())?,
            Err(e) => {
                log::error!("{}: {}", path.display(), e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        Ok(ExitCode::GeneralError)
    } else {
        Ok(ExitCode::Success)
    }
}
