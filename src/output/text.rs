//! Human-readable text output.
//!
//! Groups are listed in discovery order with the retained copy marked,
//! followed by a summary block and any diagnostics.

use std::fmt::Display;
use std::io::Write;

use bytesize::ByteSize;
use yansi::{Condition, Paint, Painted, Style};

use super::OutputError;
use crate::duplicates::{DuplicateGroup, DuplicateSet, ScanSummary};

const HEADER: Style = Style::new().bold();
const KEEP: Style = Style::new().green();
const DUP: Style = Style::new().yellow();
const DIM: Style = Style::new().dim();
const WARN: Style = Style::new().red();

/// Text output formatter.
pub struct TextOutput<'a> {
    set: &'a DuplicateSet,
    summary: &'a ScanSummary,
    color: bool,
}

impl<'a> TextOutput<'a> {
    /// Create a new text formatter. Colors follow the global yansi setting.
    #[must_use]
    pub fn new(set: &'a DuplicateSet, summary: &'a ScanSummary) -> Self {
        Self {
            set,
            summary,
            color: true,
        }
    }

    /// Force colors off (or back on).
    #[must_use]
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    fn paint<'v, T: Display + ?Sized>(&self, value: &'v T, style: Style) -> Painted<&'v T> {
        let condition = if self.color {
            Condition::ALWAYS
        } else {
            Condition::NEVER
        };
        value.paint(style).whenever(condition)
    }

    /// Write the listing to `writer`.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError::Io`] if writing fails.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<(), OutputError> {
        if self.set.is_empty() {
            writeln!(writer, "{}", self.paint("No duplicates found.", HEADER))?;
        }

        let total = self.set.len();
        for (idx, group) in self.set.iter().enumerate() {
            self.write_group(&mut writer, idx, total, group)?;
        }

        self.write_summary(&mut writer)?;

        if !self.set.diagnostics.is_empty() {
            writeln!(writer)?;
            writeln!(
                writer,
                "{}",
                self.paint(&format!("Diagnostics ({}):", self.set.diagnostics.len()), WARN)
            )?;
            for diagnostic in &self.set.diagnostics {
                writeln!(writer, "  {}", diagnostic)?;
            }
        }

        writer.flush()?;
        Ok(())
    }

    fn write_group<W: Write>(
        &self,
        writer: &mut W,
        idx: usize,
        total: usize,
        group: &DuplicateGroup,
    ) -> Result<(), OutputError> {
        let header = format!(
            "Group {}/{}: {} files, {} each",
            idx + 1,
            total,
            group.len(),
            ByteSize(group.size)
        );
        let digest = format!("{} {}", group.digest.algorithm(), group.digest_hex());
        writeln!(
            writer,
            "{}  {}",
            self.paint(&header, HEADER),
            self.paint(&digest, DIM)
        )?;

        for (i, file) in group.files.iter().enumerate() {
            let path = file.path.display();
            if i == 0 {
                writeln!(writer, "  {} {}", self.paint("keep", KEEP), path)?;
            } else {
                writeln!(writer, "  {} {}", self.paint("dup ", DUP), path)?;
            }
        }
        writeln!(writer)?;
        Ok(())
    }

    fn write_summary<W: Write>(&self, writer: &mut W) -> Result<(), OutputError> {
        let s = self.summary;
        let mode = if s.verified { ", verified" } else { "" };
        writeln!(
            writer,
            "{}",
            self.paint(
                &format!(
                    "Scanned {} files ({}) in {:.2}s using {}{}",
                    s.total_files,
                    s.total_size_display(),
                    s.scan_duration.as_secs_f64(),
                    s.algorithm,
                    mode
                ),
                HEADER
            )
        )?;
        writeln!(
            writer,
            "  {} duplicate groups, {} redundant files, {} reclaimable ({:.1}%)",
            s.duplicate_groups,
            s.duplicate_files,
            s.reclaimable_display(),
            s.wasted_percentage()
        )?;
        writeln!(
            writer,
            "  {} unique files, {} excluded by errors, {} below minimum size",
            s.unique_files, s.excluded_files, s.below_min_size
        )?;
        if s.collisions_rejected > 0 {
            writeln!(
                writer,
                "  {} digest collisions rejected by byte comparison",
                s.collisions_rejected
            )?;
        }
        Ok(())
    }
}
