//! Acting on duplicate groups.
//!
//! - [`delete`]: verified single-file removal (permanent or trash)
//! - [`disposition`]: applying report-only, interactive or automatic policies
//! - [`prompt`]: the terminal selection source used by interactive mode
//!
//! ```no_run
//! use dupefind::actions::{DispositionEngine, DispositionPolicy, DeleteConfig};
//! use dupefind::duplicates::DuplicateFinder;
//! use std::path::Path;
//!
//! let (set, _summary) = DuplicateFinder::with_defaults()
//!     .find_duplicates(Path::new("."))
//!     .unwrap();
//! let engine = DispositionEngine::new(DeleteConfig::trash().with_dry_run(true));
//! let report = engine.apply(&set, DispositionPolicy::Automatic, None).unwrap();
//! println!("{}", report.summary());
//! ```

pub mod delete;
pub mod disposition;
pub mod prompt;

pub use delete::{
    delete_to_trash, delete_verified, permanent_delete, validate_preserves_copy, DeleteConfig,
    DeleteError, DeleteResult, FileSnapshot, RemovalMode,
};
pub use disposition::{
    DeletionFailure, DispositionEngine, DispositionError, DispositionPolicy, DispositionReport,
    GroupDisposition, RetainFirst, SelectionSource,
};
pub use prompt::{parse_selection, TerminalPrompt};
