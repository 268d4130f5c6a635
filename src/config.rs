//! Application configuration.
//!
//! Settings are layered with `figment`, later layers winning:
//!
//! 1. [`Config::default`]
//! 2. a TOML file (`--config FILE`, or `dupefind/config.toml` in the
//!    platform config directory when present)
//! 3. `DUPEFIND_*` environment variables (`DUPEFIND_ALGORITHM=sha1`)
//! 4. command-line flags that were actually given
//!
//! ```toml
//! algorithm = "sha512"
//! min_size = 4096
//! verify = true
//! ignore_patterns = ["*.tmp", "target/"]
//! removal = "trash"
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::actions::RemovalMode;
use crate::cli::ScanArgs;
use crate::duplicates::{FinderConfig, DEFAULT_IO_THREADS};
use crate::output::OutputFormat;
use crate::scanner::{DigestAlgorithm, WalkerConfig};

/// Prefix for configuration environment variables.
pub const ENV_PREFIX: &str = "DUPEFIND_";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A config file named with `--config` does not exist.
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    /// A layer could not be parsed or had the wrong type.
    #[error("invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),

    /// A value parsed but is out of range.
    #[error("invalid value for '{key}': {message}")]
    InvalidValue {
        /// Configuration key
        key: &'static str,
        /// What is wrong with it
        message: String,
    },
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Digest algorithm for content comparison.
    pub algorithm: DigestAlgorithm,
    /// Files smaller than this many bytes are ignored.
    pub min_size: u64,
    /// Threads used for digesting and verification.
    pub io_threads: usize,
    /// Confirm every group byte-for-byte.
    pub verify: bool,
    /// Skip hidden files and directories.
    pub skip_hidden: bool,
    /// Follow symbolic links.
    pub follow_symlinks: bool,
    /// Gitignore-style patterns to skip.
    pub ignore_patterns: Vec<String>,
    /// Default output format.
    pub output: OutputFormat,
    /// Removal backend for deletions.
    pub removal: RemovalMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            algorithm: DigestAlgorithm::default(),
            min_size: 0,
            io_threads: DEFAULT_IO_THREADS,
            verify: false,
            skip_hidden: false,
            follow_symlinks: false,
            ignore_patterns: Vec::new(),
            output: OutputFormat::default(),
            removal: RemovalMode::default(),
        }
    }
}

impl Config {
    /// Default config file location, if the platform has one.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "dupefind").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Build the layered figment without extracting it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FileNotFound`] if an explicit file is missing.
    pub fn figment(config_file: Option<&Path>) -> Result<Figment, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));

        match config_file {
            Some(path) => {
                if !path.is_file() {
                    return Err(ConfigError::FileNotFound(path.to_path_buf()));
                }
                log::debug!("Loading config from {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
            None => {
                if let Some(path) = Self::default_path().filter(|p| p.is_file()) {
                    log::debug!("Loading config from {}", path.display());
                    figment = figment.merge(Toml::file(path));
                }
            }
        }

        Ok(figment.merge(Env::prefixed(ENV_PREFIX)))
    }

    /// Load configuration from defaults, file and environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a layer is malformed or a value is out of range.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        Self::from_figment(&Self::figment(config_file)?)
    }

    /// Extract and validate a configuration from `figment`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if extraction or validation fails.
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let config: Config = figment.extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.io_threads == 0 {
            return Err(ConfigError::InvalidValue {
                key: "io_threads",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Apply flags that were given on the command line.
    ///
    /// Switches given either way (`--verify` or `--no-verify`) replace the
    /// configured value. Ignore patterns are appended to the configured ones.
    #[must_use]
    pub fn with_scan_args(mut self, args: &ScanArgs) -> Self {
        if let Some(algorithm) = args.algorithm {
            self.algorithm = algorithm;
        }
        if let Some(min_size) = args.min_size {
            self.min_size = min_size;
        }
        if let Some(threads) = args.io_threads {
            self.io_threads = threads.max(1);
        }
        if let Some(output) = args.output {
            self.output = output;
        }
        if let Some(verify) = args.verify_flag() {
            self.verify = verify;
        }
        if let Some(skip_hidden) = args.skip_hidden_flag() {
            self.skip_hidden = skip_hidden;
        }
        if let Some(follow) = args.follow_symlinks_flag() {
            self.follow_symlinks = follow;
        }
        if args.trash {
            self.removal = RemovalMode::Trash;
        }
        self.ignore_patterns
            .extend(args.ignore_patterns.iter().cloned());
        self
    }

    /// Walker settings derived from this configuration.
    #[must_use]
    pub fn walker_config(&self) -> WalkerConfig {
        WalkerConfig::new(
            self.follow_symlinks,
            self.skip_hidden,
            self.ignore_patterns.clone(),
        )
    }

    /// Finder settings derived from this configuration.
    ///
    /// Shutdown flag and progress callback are attached by the caller.
    #[must_use]
    pub fn finder_config(&self) -> FinderConfig {
        FinderConfig::default()
            .with_algorithm(self.algorithm)
            .with_min_size(self.min_size)
            .with_verify(self.verify)
            .with_io_threads(self.io_threads)
            .with_walker_config(self.walker_config())
    }
}
