//! Rewrite: update, delete and upsert by reading a file fully and writing
//! the surviving rows back.
//!
//! Each partition file is handled on its own: it is read to the end with a
//! single reader, the reader is closed, and the file is truncated and
//! rewritten only if a row was removed or changed. The rewrite is not atomic;
//! a crash mid-write can lose the file's rows. Buffered rows are never
//! touched.
use anyhow::Result;
use codec::{CsvReader, WriteMode};
use std::path::Path;
use tracing::debug;

use crate::error::DbError;
use crate::partition::Partition;
use crate::predicate::Predicate;
use crate::value::Value;
use crate::write::write_rows;
use crate::Table;

/// Outcome of an update, delete or upsert.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RewriteStats {
    /// Rows read.
    pub scanned: usize,
    /// Rows the predicate accepted.
    pub matched: usize,
    /// Rows written back.
    pub kept: usize,
    /// Files rewritten.
    pub files_rewritten: usize,
    /// Set when an upsert matched nothing and inserted a new row.
    pub inserted: bool,
}

impl RewriteStats {
    fn absorb(&mut self, other: RewriteStats) {
        self.scanned += other.scanned;
        self.matched += other.matched;
        self.kept += other.kept;
        self.files_rewritten += other.files_rewritten;
    }
}

/// Rewrites one file. With `updates` matching rows are modified in place
/// and kept (an empty list keeps them unchanged); without it they are
/// removed.
pub(crate) fn rewrite_file(
    path: &Path,
    pred: &Predicate,
    updates: Option<&[(usize, String)]>,
) -> Result<RewriteStats> {
    let mut stats = RewriteStats::default();
    if !path.is_file() {
        return Ok(stats);
    }

    let mut kept = Vec::new();
    let mut changed = false;
    {
        let mut reader = CsvReader::open(path).map_err(DbError::from)?;
        while let Some(mut row) = reader.next_record().map_err(DbError::from)? {
            stats.scanned += 1;
            if !pred.matches(&row) {
                kept.push(row);
                continue;
            }
            stats.matched += 1;
            if let Some(updates) = updates {
                for (idx, value) in updates {
                    if let Some(field) = row.get_mut(*idx) {
                        if field != value {
                            field.clone_from(value);
                            changed = true;
                        }
                    }
                }
                kept.push(row);
            }
        }
    }
    stats.kept = kept.len();

    if stats.kept != stats.scanned || changed {
        write_rows(path, &kept, WriteMode::Truncate)?;
        stats.files_rewritten = 1;
        debug!(
            file = %path.display(),
            scanned = stats.scanned,
            matched = stats.matched,
            kept = stats.kept,
            "rewrote file"
        );
    }
    Ok(stats)
}

/// Splits `(column, value)` pairs into the two lists `insert_row` takes.
fn split_updates<'u>(updates: &'u [(&'u str, Value)]) -> (Vec<&'u str>, Vec<Value>) {
    updates.iter().map(|(c, v)| (*c, v.clone())).unzip()
}

impl Partition {
    /// Applies `updates` to every flushed row of this partition matching
    /// `pred`. Matching rows are always kept.
    pub fn update(&mut self, pred: &Predicate, updates: &[(&str, Value)]) -> Result<RewriteStats> {
        let resolved = self.schema.resolve_updates(updates)?;
        rewrite_file(&self.path, pred, Some(resolved.as_slice()))
    }

    /// Removes every flushed row of this partition matching `pred`.
    pub fn delete(&mut self, pred: &Predicate) -> Result<RewriteStats> {
        rewrite_file(&self.path, pred, None)
    }

    /// Updates the matching rows, or inserts one built from `updates` (other
    /// columns empty) and flushes when nothing matched.
    pub fn upsert(&mut self, pred: &Predicate, updates: &[(&str, Value)]) -> Result<RewriteStats> {
        let mut stats = self.update(pred, updates)?;
        if stats.matched == 0 {
            let (columns, values) = split_updates(updates);
            self.insert_row(Some(columns.as_slice()), &values)?;
            self.flush()?;
            stats.inserted = true;
        }
        Ok(stats)
    }

    /// Empties the partition file, creating it if needed.
    pub fn truncate(&mut self) -> Result<()> {
        write_rows(&self.path, &[], WriteMode::Truncate)?;
        debug!(partition = %self.id, "truncated");
        Ok(())
    }
}

impl Table {
    /// Applies `updates` to every flushed row matching `pred` across all
    /// partitions. Matching rows are always kept; use [`Table::delete`] to
    /// remove them.
    ///
    /// # Errors
    ///
    /// Unknown update columns are rejected before any file is touched. A
    /// failure on one file leaves files already rewritten as they are.
    pub fn update(&mut self, pred: &Predicate, updates: &[(&str, Value)]) -> Result<RewriteStats> {
        let resolved = self.schema.resolve_updates(updates)?;
        self.rewrite(pred, Some(resolved.as_slice()))
    }

    /// Removes every flushed row matching `pred` across all partitions.
    pub fn delete(&mut self, pred: &Predicate) -> Result<RewriteStats> {
        self.rewrite(pred, None)
    }

    /// Updates the matching rows in every partition, or inserts one row into
    /// the default partition and flushes when nothing matched.
    pub fn upsert(&mut self, pred: &Predicate, updates: &[(&str, Value)]) -> Result<RewriteStats> {
        let mut stats = self.update(pred, updates)?;
        if stats.matched == 0 {
            let (columns, values) = split_updates(updates);
            self.default.insert_row(Some(columns.as_slice()), &values)?;
            self.default.flush()?;
            stats.inserted = true;
        }
        Ok(stats)
    }

    /// Empties every partition file. With no partition file yet, creates an
    /// empty default partition.
    pub fn truncate(&mut self) -> Result<()> {
        let files = self.data_files()?;
        if files.is_empty() {
            write_rows(self.default.path(), &[], WriteMode::Truncate)?;
        }
        for path in &files {
            write_rows(path, &[], WriteMode::Truncate)?;
        }
        debug!(table = self.name(), files = files.len(), "truncated");
        Ok(())
    }

    fn rewrite(&mut self, pred: &Predicate, updates: Option<&[(usize, String)]>) -> Result<RewriteStats> {
        let mut stats = RewriteStats::default();
        for path in self.data_files()? {
            stats.absorb(rewrite_file(&path, pred, updates)?);
        }
        Ok(stats)
    }
}
