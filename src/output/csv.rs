//! CSV output formatter for duplicate scan results.
//!
//! One row is generated for each member of each duplicate group.
//!
//! # Columns
//!
//! - `group_id`: 1-based group number in discovery order
//! - `path`: Path to the file
//! - `size`: File size in bytes
//! - `digest`: Content digest (hexadecimal)

use std::io;

use serde::Serialize;

use super::OutputError;
use crate::duplicates::DuplicateSet;

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    group_id: usize,
    path: String,
    size: u64,
    digest: &'a str,
}

/// CSV output formatter.
pub struct CsvOutput<'a> {
    set: &'a DuplicateSet,
}

impl<'a> CsvOutput<'a> {
    /// Create a new CSV output formatter.
    #[must_use]
    pub fn new(set: &'a DuplicateSet) -> Self {
        Self { set }
    }

    /// Write the CSV output to the given writer.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError`] if writing or serialization fails.
    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<(), OutputError> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        for (idx, group) in self.set.groups.iter().enumerate() {
            let digest = group.digest_hex();
            for file in &group.files {
                csv_writer.serialize(CsvRow {
                    group_id: idx + 1,
                    path: file.path.to_string_lossy().into_owned(),
                    size: file.size,
                    digest: &digest,
                })?;
            }
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Generate CSV output as a string.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError`] if serialization fails.
    pub fn to_string(&self) -> Result<String, OutputError> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
