use anyhow::Result;
use codec::{CsvWriter, WriteMode};
use std::path::Path;
use tracing::{debug, warn};

use crate::error::DbError;
use crate::partition::Partition;
use crate::value::Value;
use crate::Table;

impl Partition {
    /// Buffers one row and flushes once the buffer is full.
    ///
    /// With `columns` the values are placed at the named positions and every
    /// other field is empty; without it `values` must cover every column in
    /// order.
    ///
    /// # Errors
    ///
    /// Argument count mismatch, unknown column, or a failure of the implicit
    /// flush. A rejected row is not buffered.
    pub fn insert_row(&mut self, columns: Option<&[&str]>, values: &[Value]) -> Result<()> {
        let row = self.schema.build_row(columns, values)?;
        if self.buffer.register(row) {
            self.flush()?;
        }
        Ok(())
    }

    /// Writes already-formatted rows straight to the file, bypassing the
    /// buffer. Each row must have one field per column.
    ///
    /// [`WriteMode::Truncate`] replaces the file, even with no rows.
    pub fn insert_rows(&mut self, rows: &[Vec<String>], mode: WriteMode) -> Result<()> {
        if let Some(bad) = rows.iter().find(|r| r.len() != self.schema.len()) {
            return Err(DbError::ArgumentCount {
                expected: self.schema.len(),
                got: bad.len(),
            }
            .into());
        }
        if rows.is_empty() && mode == WriteMode::Append {
            return Ok(());
        }
        write_rows(&self.path, rows, mode)?;
        debug!(partition = %self.id, rows = rows.len(), ?mode, "wrote rows");
        Ok(())
    }

    /// Appends the buffered rows to the partition file (creating it if
    /// needed) and empties the buffer. A no-op when nothing is buffered.
    ///
    /// The buffer is emptied even when the write fails; those rows are lost.
    pub fn flush(&mut self) -> Result<()> {
        self.flush_with(WriteMode::Append)
    }

    /// Replaces the partition file contents with the buffered rows.
    pub fn flush_overwrite(&mut self) -> Result<()> {
        self.flush_with(WriteMode::Truncate)
    }

    fn flush_with(&mut self, mode: WriteMode) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let rows = self.buffer.len();
        let result = write_rows(&self.path, self.buffer.rows(), mode);
        self.buffer.reset();

        match &result {
            Ok(()) => debug!(partition = %self.id, rows, ?mode, "flushed buffer"),
            Err(e) => warn!(partition = %self.id, rows, error = %e, "flush failed, buffered rows dropped"),
        }
        result
    }
}

impl Table {
    /// Buffers one row in the default partition. See
    /// [`Partition::insert_row`].
    pub fn insert_row(&mut self, columns: Option<&[&str]>, values: &[Value]) -> Result<()> {
        self.default.insert_row(columns, values)
    }

    /// Appends the rows buffered through the table to the default partition.
    pub fn flush(&mut self) -> Result<()> {
        self.default.flush()
    }

    /// Replaces the default partition with the rows buffered through the
    /// table.
    pub fn flush_overwrite(&mut self) -> Result<()> {
        self.default.flush_overwrite()
    }
}

/// Writes `rows` to `path` with a fresh writer, closing it before returning.
pub(crate) fn write_rows(path: &Path, rows: &[Vec<String>], mode: WriteMode) -> Result<()> {
    let mut writer = CsvWriter::open(path, mode).map_err(DbError::from)?;
    for row in rows {
        writer.write_record(row).map_err(DbError::from)?;
    }
    writer.close().map_err(DbError::from)?;
    Ok(())
}
