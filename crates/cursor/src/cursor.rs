//! Forward-only row cursor over an ordered list of record files.

use anyhow::Result;
use codec::{CodecError, CsvReader};
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::listing::sorted_glob;

/// Position of a [`RowCursor`] in its file list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// No file has been opened yet.
    Unstarted,
    /// Reading the file at this index of the file list.
    Reading(usize),
    /// Every file has been consumed, or an open/read failed.
    Exhausted,
}

/// Sequential iterator over the raw string rows of several files.
///
/// Files are visited in list order; when one is exhausted it is closed and
/// the next one is opened. At most one file is open at a time.
///
/// A failure to open or decode a file stops the cursor and is kept in
/// [`err`](RowCursor::err). Running off the end of the list clears it.
pub struct RowCursor {
    filenames: Vec<PathBuf>,
    state: CursorState,
    reader: Option<CsvReader>,
    values: Vec<String>,
    err: Option<CodecError>,
}

impl RowCursor {
    /// Creates a cursor over `filenames`, visited in the given order.
    pub fn new(filenames: Vec<PathBuf>) -> Self {
        Self {
            filenames,
            state: CursorState::Unstarted,
            reader: None,
            values: Vec::new(),
            err: None,
        }
    }

    /// Creates a cursor over every file matching `pattern`, oldest first.
    pub fn from_glob(pattern: &str) -> Result<Self> {
        let (_, filenames) = sorted_glob(pattern)?;
        Ok(Self::new(filenames))
    }

    /// Moves to the next row. Returns `false` once no row is left or an
    /// error stopped the cursor.
    ///
    /// A file that fails to open or decode ends the whole scan rather than
    /// being skipped, so callers such as `count` can report the failure
    /// instead of a partial result. Check [`err`](RowCursor::err) after a
    /// `false`.
    pub fn advance(&mut self) -> bool {
        loop {
            let idx = match self.state {
                CursorState::Exhausted => return false,
                CursorState::Unstarted => {
                    if !self.open_at(0) {
                        return false;
                    }
                    0
                }
                CursorState::Reading(i) => i,
            };

            let reader = match self.reader.as_mut() {
                Some(r) => r,
                None => {
                    self.finish(None);
                    return false;
                }
            };

            match reader.next_record() {
                Ok(Some(values)) => {
                    self.values = values;
                    return true;
                }
                Ok(None) => {
                    if !self.open_at(idx + 1) {
                        return false;
                    }
                }
                Err(e) => {
                    warn!(file = %self.filenames[idx].display(), error = %e, "row cursor stopped on read error");
                    self.finish(Some(e));
                    return false;
                }
            }
        }
    }

    /// Opens the file at `idx`, closing the current one. Returns `false` and
    /// exhausts the cursor when there is no such file or it cannot be opened.
    fn open_at(&mut self, idx: usize) -> bool {
        self.reader = None;
        let path = match self.filenames.get(idx) {
            Some(p) => p,
            None => {
                self.finish(None);
                return false;
            }
        };

        debug!(file = %path.display(), index = idx, "row cursor opening file");
        match CsvReader::open(path) {
            Ok(r) => {
                self.reader = Some(r);
                self.state = CursorState::Reading(idx);
                true
            }
            Err(e) => {
                self.finish(Some(e));
                false
            }
        }
    }

    fn finish(&mut self, err: Option<CodecError>) {
        self.reader = None;
        self.values.clear();
        self.state = CursorState::Exhausted;
        self.err = err;
    }

    /// Fields of the current row; empty before the first `advance` and after
    /// the cursor is exhausted.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Moves the current row out of the cursor.
    pub fn take_values(&mut self) -> Vec<String> {
        std::mem::take(&mut self.values)
    }

    /// Error that stopped the cursor, if any.
    pub fn err(&self) -> Option<&CodecError> {
        self.err.as_ref()
    }

    pub fn take_err(&mut self) -> Option<CodecError> {
        self.err.take()
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    pub fn filenames(&self) -> &[PathBuf] {
        &self.filenames
    }

    /// Releases the open file, rewinds to the start of the file list and
    /// clears any pending error. Safe to call repeatedly.
    pub fn close(&mut self) {
        self.reader = None;
        self.values.clear();
        self.state = CursorState::Unstarted;
        self.err = None;
    }
}

impl Iterator for RowCursor {
    type Item = Vec<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.advance() {
            Some(self.take_values())
        } else {
            None
        }
    }
}

impl std::fmt::Debug for RowCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowCursor")
            .field("filenames", &self.filenames)
            .field("state", &self.state)
            .field("err", &self.err)
            .finish()
    }
}
