//! Line-oriented selection prompt for interactive disposition.
//!
//! Each group is printed as a numbered list and the user answers with
//! the members to delete:
//!
//! - `2` or `2 3` or `2,3` selects single members (1-based)
//! - `2-4` selects a range
//! - `a` / `all` selects everything except the first member
//! - empty input or `s` skips the group

use std::io::{BufRead, Write};

use super::disposition::SelectionSource;
use crate::duplicates::DuplicateGroup;

/// Parse a selection answer into zero-based indices.
///
/// Unparseable tokens are ignored. Indices are not range-checked beyond
/// rejecting `0`; the disposition engine drops out-of-range entries.
#[must_use]
pub fn parse_selection(input: &str, len: usize) -> Vec<usize> {
    let input = input.trim();
    if input.is_empty() || input.eq_ignore_ascii_case("s") || input.eq_ignore_ascii_case("skip") {
        return Vec::new();
    }
    if input.eq_ignore_ascii_case("a") || input.eq_ignore_ascii_case("all") {
        return (1..len).collect();
    }

    let mut selected = Vec::new();
    for token in input.split(|c: char| c == ',' || c.is_whitespace()) {
        if token.is_empty() {
            continue;
        }
        if let Some((start, end)) = token.split_once('-') {
            match (start.trim().parse::<usize>(), end.trim().parse::<usize>()) {
                (Ok(start), Ok(end)) if start >= 1 && start <= end => {
                    selected.extend((start..=end).map(|n| n - 1));
                }
                _ => log::debug!("Ignoring selection token: {}", token),
            }
        } else {
            match token.parse::<usize>() {
                Ok(n) if n >= 1 => selected.push(n - 1),
                _ => log::debug!("Ignoring selection token: {}", token),
            }
        }
    }
    selected.sort_unstable();
    selected.dedup();
    selected
}

/// Prompts on a writer and reads answers from a reader.
///
/// End of input answers "skip" for every remaining group.
pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
    total_groups: usize,
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    /// Create a prompt over the given streams.
    pub fn new(input: R, output: W, total_groups: usize) -> Self {
        Self {
            input,
            output,
            total_groups,
        }
    }

    fn render(&mut self, group_index: usize, group: &DuplicateGroup) -> std::io::Result<()> {
        writeln!(
            self.output,
            "\nGroup {}/{} ({} files, {} each, {})",
            group_index + 1,
            self.total_groups,
            group.len(),
            bytesize::ByteSize(group.size),
            group.digest_hex()
        )?;
        for (i, file) in group.files.iter().enumerate() {
            writeln!(self.output, "  [{}] {}", i + 1, file.path.display())?;
        }
        write!(
            self.output,
            "Delete which? (e.g. 2 3, 2-4, a = all but first, Enter = skip): "
        )?;
        self.output.flush()
    }
}

impl<R: BufRead, W: Write> SelectionSource for TerminalPrompt<R, W> {
    fn select(&mut self, group_index: usize, group: &DuplicateGroup) -> Vec<usize> {
        if let Err(e) = self.render(group_index, group) {
            log::warn!("Failed to write prompt: {}", e);
            return Vec::new();
        }

        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => {
                log::debug!("End of input, skipping group {}", group_index + 1);
                Vec::new()
            }
            Ok(_) => parse_selection(&line, group.len()),
            Err(e) => {
                log::warn!("Failed to read selection: {}", e);
                Vec::new()
            }
        }
    }
}

impl<R, W> std::fmt::Debug for TerminalPrompt<R, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalPrompt")
            .field("total_groups", &self.total_groups)
            .finish_non_exhaustive()
    }
}
