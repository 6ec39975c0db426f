//! Aligned coverage-stat tables for reports.
//!
//! Collects `(filename, description, covered, table_size)` rows, tracks the
//! width each column needs, and prints them as aligned
//! `covered out of total (percent%)` lines. Output stability matters: the
//! fuzzing scripts downstream diff these tables between corpus runs.

use crate::error::MapearResult;
use crate::shadow_map::{covered_count, read_bit_vector};
use std::path::Path;

/// Sort order for [`MapStatPrinter::sort`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Keep insertion order
    #[default]
    None,
    /// Ascending by covered count
    Asc,
    /// Descending by covered count
    Desc,
}

#[derive(Debug, Clone)]
struct Stat {
    filename: String,
    description: String,
    covered: usize,
    table_size: usize,
}

/// Accumulates coverage rows and prints them aligned
#[derive(Debug, Default)]
pub struct MapStatPrinter {
    stats: Vec<Stat>,
    description: String,
    max_filename_len: usize,
    max_desc_len: usize,
    max_table_size: usize,
    limit: Option<usize>,
}

impl MapStatPrinter {
    /// Create an empty printer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Description attached to every subsequently added row
    pub fn set_row_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
        self.max_desc_len = self.description.len();
    }

    /// Read a map file of `table_size` bits and add its coverage as a row
    ///
    /// # Errors
    ///
    /// Propagates [`read_bit_vector`] failures.
    pub fn add_file(
        &mut self,
        path: impl AsRef<Path>,
        table_size: usize,
    ) -> MapearResult<()> {
        let map = read_bit_vector(table_size, &path)?;
        self.add_file_map(path, &map);
        Ok(())
    }

    /// Add a row for an already-loaded map
    pub fn add_file_map(&mut self, path: impl AsRef<Path>, map: &[bool]) {
        self.push(
            path.as_ref().display().to_string(),
            self.description.clone(),
            covered_count(map),
            map.len(),
        );
    }

    /// Add an anonymous row for an already-loaded map
    pub fn add_map(&mut self, map: &[bool]) {
        self.push(
            String::new(),
            self.description.clone(),
            covered_count(map),
            map.len(),
        );
    }

    /// Add a row from precomputed counts, described by `desc`
    pub fn add_stat(&mut self, desc: impl Into<String>, covered: usize, table_size: usize) {
        self.push(String::new(), desc.into(), covered, table_size);
    }

    /// Add a summary row. Summaries do not consume the row limit; with
    /// `align_to_desc` the label lands in the description column, otherwise
    /// in the filename column.
    pub fn summarize(
        &mut self,
        desc: impl Into<String>,
        covered: usize,
        table_size: usize,
        align_to_desc: bool,
    ) {
        if let Some(limit) = self.limit.as_mut() {
            *limit += 1;
        }
        if align_to_desc {
            self.push(String::new(), desc.into(), covered, table_size);
        } else {
            self.push(desc.into(), String::new(), covered, table_size);
        }
    }

    /// Add a summary row for an already-loaded map
    pub fn summarize_map(&mut self, desc: impl Into<String>, map: &[bool], align_to_desc: bool) {
        self.summarize(desc, covered_count(map), map.len(), align_to_desc);
    }

    /// Sort collected rows by covered count
    pub fn sort(&mut self, order: SortOrder) {
        match order {
            SortOrder::None => {}
            SortOrder::Asc => self.stats.sort_by(|a, b| a.covered.cmp(&b.covered)),
            SortOrder::Desc => self.stats.sort_by(|a, b| b.covered.cmp(&a.covered)),
        }
    }

    /// Cap the number of non-summary rows still accepted
    pub fn limit(&mut self, limit: usize) {
        self.limit = Some(limit);
    }

    /// Whether the row limit is exhausted
    #[must_use]
    pub fn at_limit(&self) -> bool {
        self.limit == Some(0)
    }

    /// Number of collected rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.stats.len()
    }

    /// Whether no rows were collected
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    /// Render all rows without clearing state
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for stat in &self.stats {
            out.push_str(&self.format_row(stat));
            out.push('\n');
        }
        out
    }

    /// Print all rows to stdout and reset the printer
    pub fn print(&mut self) {
        print!("{}", self.render());
        self.stats.clear();
        self.description.clear();
        self.max_filename_len = 0;
        self.max_desc_len = 0;
        self.max_table_size = 0;
        self.limit = None;
    }

    fn push(&mut self, filename: String, description: String, covered: usize, table_size: usize) {
        if let Some(limit) = self.limit.as_mut() {
            if *limit == 0 {
                return;
            }
            *limit -= 1;
        }
        self.max_table_size = self.max_table_size.max(table_size);
        self.max_filename_len = self.max_filename_len.max(filename.len());
        self.max_desc_len = self.max_desc_len.max(description.len());
        self.stats.push(Stat {
            filename,
            description,
            covered,
            table_size,
        });
    }

    #[allow(clippy::cast_precision_loss)]
    fn format_row(&self, stat: &Stat) -> String {
        let mut row = String::new();
        row.push_str(&format!(
            "{:>width$}",
            stat.filename,
            width = self.max_filename_len
        ));
        if !stat.filename.is_empty() {
            row.push_str(": ");
        } else if self.max_filename_len > 0 {
            row.push_str("  ");
        }

        row.push_str(&format!(
            "{:>width$}",
            stat.description,
            width = self.max_desc_len
        ));
        if !stat.description.is_empty() {
            row.push_str(": ");
        } else if self.max_desc_len > 0 {
            row.push_str("  ");
        }

        let idx_width = self.max_table_size.to_string().len();
        let coverage = if stat.table_size == 0 {
            0.0
        } else {
            stat.covered as f64 / stat.table_size as f64 * 100.0
        };
        row.push_str(&format!(
            "{:>idx_width$} out of {:>idx_width$} ({coverage:.6}%)",
            stat.covered, stat.table_size
        ));
        row
    }
}
