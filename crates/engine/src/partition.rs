use anyhow::Result;
use buffer::InsertBuffer;
use cursor::RowCursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::remove_file_if_exists;
use crate::schema::Schema;

/// Handle on one partition file of a table.
///
/// Each handle owns its insert buffer; rows become visible to reads once
/// flushed. Dropping the handle flushes whatever is still buffered.
pub struct Partition {
    pub(crate) id: String,
    pub(crate) path: PathBuf,
    pub(crate) schema: Arc<Schema>,
    pub(crate) buffer: InsertBuffer,
}

impl std::fmt::Debug for Partition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Partition")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("buffered", &self.buffer.len())
            .field("capacity", &self.buffer.capacity())
            .finish()
    }
}

impl Partition {
    pub(crate) fn new(id: String, path: PathBuf, schema: Arc<Schema>, buffer_size: usize) -> Self {
        Self {
            id,
            path,
            schema,
            buffer: InsertBuffer::new(buffer_size),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Whether the partition file exists.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Deletes the partition file and discards buffered rows.
    pub fn drop_partition(mut self) -> Result<()> {
        self.discard_buffer();
        remove_file_if_exists(&self.path)?;
        debug!(partition = %self.id, file = %self.path.display(), "dropped partition");
        Ok(())
    }

    pub(crate) fn discard_buffer(&mut self) {
        self.buffer.reset();
    }

    pub(crate) fn cursor(&self) -> RowCursor {
        if self.exists() {
            RowCursor::new(vec![self.path.clone()])
        } else {
            RowCursor::new(Vec::new())
        }
    }
}

/// Best-effort flush on drop.
///
/// Errors are ignored because `Drop` cannot report them; call
/// [`Partition::flush`] to observe them.
impl Drop for Partition {
    fn drop(&mut self) {
        if !self.buffer.is_empty() {
            let _ = self.flush();
        }
    }
}
