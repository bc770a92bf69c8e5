//! # Engine - Flat-File Table Store
//!
//! Tables of string-valued rows kept as CSV files, optionally gzipped. Each
//! table has a metadata file and a data directory holding one file per
//! partition.
//!
//! ## Layout
//!
//! ```text
//! root/
//!   users.tbl.ini          name, columns, useGzip, bufferSize
//!   users/
//!     default.csv          rows inserted through the table handle
//!     001.csv              rows inserted through partition "001"
//!     002.csv
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module        | Purpose                                                 |
//! |---------------|---------------------------------------------------------|
//! | [`lib.rs`]    | `Table` struct, create/load, partitions, accessors      |
//! | [`partition`] | `Partition` handle and its buffer                       |
//! | [`write`]     | `insert_row()`, `insert_rows()`, `flush()`              |
//! | [`read`]      | `count()`, `sum()`, `min()`, `max()`, `select_rows()`   |
//! | [`rewrite`]   | `update()`, `delete()`, `upsert()`, `truncate()`        |
//! | [`rows`]      | `RowSet` with projection, `scan()` and `order_by()`     |
//! | [`metadata`]  | Metadata file format (atomic writes)                    |
//! | [`group`]     | Tables sharing one schema under a group directory       |
//! | [`db`]        | Registry of every table and group under a base dir      |
//!
//! ## Reads See Only Flushed Rows
//!
//! Inserts are buffered in memory and appended to the partition file when the
//! buffer reaches `bufferSize` or on an explicit `flush()`. Every read goes to
//! the files, so buffered rows are invisible until flushed. Reads through a
//! table span every partition file, oldest modification time first.
mod db;
mod def;
mod error;
mod group;
mod metadata;
mod partition;
mod predicate;
mod read;
mod rewrite;
mod rows;
mod schema;
mod value;
mod write;

use anyhow::Result;
use config::DEFAULT_BUFFER_SIZE;
use cursor::{dir_pattern, sorted_glob, RowCursor};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

pub use codec::WriteMode;
pub use db::Database;
pub use def::{partition_suffix, validate_column, validate_name, validate_partition_id, TableDef};
pub use error::{error_kind, DbError, ErrorKind};
pub use group::TableGroup;
pub use metadata::TableMeta;
pub use partition::Partition;
pub use predicate::Predicate;
pub use rewrite::RewriteStats;
pub use rows::{Direction, FieldType, RowSet};
pub use schema::Schema;
pub use value::{parse_bool, Dest, Value};

/// Handle on one table.
///
/// Rows inserted through the table go to its default partition. Reads,
/// updates and deletes cover every partition file of the table.
///
/// Dropping the handle flushes any rows still buffered in the default
/// partition.
pub struct Table {
    pub(crate) def: TableDef,
    pub(crate) schema: Arc<Schema>,
    pub(crate) use_gzip: bool,
    pub(crate) buffer_size: usize,
    pub(crate) default: Partition,
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.def.name())
            .field("data_dir", &self.def.data_dir())
            .field("columns", &self.schema.columns())
            .field("use_gzip", &self.use_gzip)
            .field("buffer_size", &self.buffer_size)
            .field("buffered", &self.default.buffered())
            .finish()
    }
}

impl Table {
    /// Creates table `name` under `root_dir`: writes its metadata file and
    /// creates its data directory.
    ///
    /// A `buffer_size` of `0` means [`DEFAULT_BUFFER_SIZE`].
    ///
    /// # Errors
    ///
    /// Fails if the name or a column name is invalid, `columns` is empty, or
    /// a table with that name already exists under `root_dir`.
    pub fn create<P: AsRef<Path>>(
        root_dir: P,
        name: &str,
        columns: &[&str],
        use_gzip: bool,
        buffer_size: usize,
    ) -> Result<Self> {
        let def = TableDef::init(name, root_dir.as_ref())?;
        if def.ini_file().exists() {
            return Err(DbError::TableExists(name.to_string()).into());
        }
        let columns = checked_columns(columns)?;
        let buffer_size = effective_buffer_size(buffer_size);

        fs::create_dir_all(root_dir.as_ref())?;
        let meta = TableMeta {
            name: name.to_string(),
            columns: columns.clone(),
            use_gzip,
            buffer_size,
            table_names: None,
        };
        meta.save(def.ini_file())?;
        fs::create_dir_all(def.data_dir())?;

        debug!(table = name, columns = columns.len(), use_gzip, buffer_size, "created table");
        Ok(Self::from_parts(def, columns, use_gzip, buffer_size))
    }

    /// Loads table `name` from its metadata file under `root_dir`.
    pub fn load<P: AsRef<Path>>(root_dir: P, name: &str) -> Result<Self> {
        let def = TableDef::init(name, root_dir.as_ref())?;
        Self::open(def.ini_file())
    }

    /// Loads the table described by the metadata file at `ini_path`.
    ///
    /// The table name and data directory are derived from the file name; a
    /// different `name` recorded inside the file is ignored.
    pub fn open<P: AsRef<Path>>(ini_path: P) -> Result<Self> {
        let ini_path = ini_path.as_ref();
        let def = TableDef::from_ini_path(ini_path)?;
        if !ini_path.exists() {
            return Err(DbError::TableNotFound(def.name().to_string()).into());
        }

        let meta = TableMeta::load(ini_path)?;
        if meta.is_group() {
            return Err(DbError::MalformedMetadata {
                path: ini_path.to_path_buf(),
                reason: format!("{} describes a table group", meta.name),
            }
            .into());
        }
        if meta.name != def.name() {
            warn!(file = %ini_path.display(), recorded = %meta.name, "metadata name differs from file name");
        }

        fs::create_dir_all(def.data_dir())?;
        debug!(table = def.name(), "loaded table");
        Ok(Self::from_parts(def, meta.columns, meta.use_gzip, meta.buffer_size))
    }

    pub(crate) fn from_parts(
        def: TableDef,
        columns: Vec<String>,
        use_gzip: bool,
        buffer_size: usize,
    ) -> Self {
        let schema = Arc::new(Schema::new(columns));
        let default = Partition::new(
            config::DEFAULT_PARTITION_ID.to_string(),
            def.default_path(use_gzip),
            Arc::clone(&schema),
            buffer_size,
        );
        Self {
            def,
            schema,
            use_gzip,
            buffer_size,
            default,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.def.name()
    }

    #[must_use]
    pub fn def(&self) -> &TableDef {
        &self.def
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        self.schema.columns()
    }

    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    #[must_use]
    pub fn use_gzip(&self) -> bool {
        self.use_gzip
    }

    #[must_use]
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Path of the default partition file.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.default.path()
    }

    /// Rows inserted through the table and not yet flushed.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.default.buffered()
    }

    /// Metadata as it is stored on disk.
    pub fn meta(&self) -> TableMeta {
        TableMeta {
            name: self.def.name().to_string(),
            columns: self.schema.columns().to_vec(),
            use_gzip: self.use_gzip,
            buffer_size: self.buffer_size,
            table_names: None,
        }
    }

    /// Handle on partition `id`, with its own insert buffer.
    ///
    /// No file is created until the partition is flushed.
    pub fn partition(&self, id: &str) -> Result<Partition> {
        validate_partition_id(id)?;
        Ok(Partition::new(
            id.to_string(),
            self.def.partition_path(id, self.use_gzip),
            Arc::clone(&self.schema),
            self.buffer_size,
        ))
    }

    /// A second handle on the default partition. Its buffer is independent
    /// of the table's.
    pub fn default_partition(&self) -> Partition {
        Partition::new(
            config::DEFAULT_PARTITION_ID.to_string(),
            self.def.default_path(self.use_gzip),
            Arc::clone(&self.schema),
            self.buffer_size,
        )
    }

    /// Ids of the partitions that have a file, oldest modification first.
    pub fn partition_ids(&self) -> Result<Vec<String>> {
        let suffix = partition_suffix(self.use_gzip);
        Ok(self
            .data_files()?
            .iter()
            .filter_map(|p| p.file_name()?.to_str()?.strip_suffix(suffix).map(str::to_string))
            .collect())
    }

    /// Deletes the file of partition `id`. A missing file is not an error.
    pub fn drop_partition(&mut self, id: &str) -> Result<()> {
        validate_partition_id(id)?;
        if id == config::DEFAULT_PARTITION_ID {
            self.default.discard_buffer();
        }
        remove_file_if_exists(&self.def.partition_path(id, self.use_gzip))?;
        debug!(table = self.def.name(), partition = id, "dropped partition");
        Ok(())
    }

    /// Deletes the data directory and metadata file of the table. Buffered
    /// rows are discarded.
    ///
    /// A group member only loses its data directory and its entry in the
    /// group's member list; the group metadata file stays.
    pub fn drop_table(mut self) -> Result<()> {
        self.default.discard_buffer();
        remove_dir_if_exists(self.def.data_dir())?;
        if self.def.is_member() {
            let mut meta = TableMeta::load(self.def.ini_file())?;
            if let Some(names) = meta.table_names.as_mut() {
                names.retain(|n| n != self.def.name());
            }
            meta.save(self.def.ini_file())?;
            debug!(table = self.def.name(), group = %meta.name, "dropped group member");
        } else {
            remove_file_if_exists(self.def.ini_file())?;
            debug!(table = self.def.name(), "dropped table");
        }
        Ok(())
    }

    /// Deletes only the data directory; used for group members whose
    /// metadata lives in the group file.
    pub(crate) fn drop_data(mut self) -> Result<()> {
        self.default.discard_buffer();
        remove_dir_if_exists(self.def.data_dir())
    }

    /// Every partition file of the table, oldest modification first.
    pub(crate) fn data_files(&self) -> Result<Vec<PathBuf>> {
        let pattern = dir_pattern(self.def.data_dir(), partition_suffix(self.use_gzip));
        let (_, files) = sorted_glob(&pattern)?;
        Ok(files)
    }

    pub(crate) fn cursor(&self) -> Result<RowCursor> {
        Ok(RowCursor::new(self.data_files()?))
    }
}

pub(crate) fn checked_columns(columns: &[&str]) -> Result<Vec<String>> {
    if columns.is_empty() {
        return Err(DbError::InvalidColumn(String::new()).into());
    }
    for c in columns {
        validate_column(c)?;
    }
    Ok(columns.iter().map(|c| c.to_string()).collect())
}

pub(crate) fn effective_buffer_size(buffer_size: usize) -> usize {
    if buffer_size == 0 {
        DEFAULT_BUFFER_SIZE
    } else {
        buffer_size
    }
}

pub(crate) fn remove_file_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(DbError::Io(e).into()),
        _ => Ok(()),
    }
}

pub(crate) fn remove_dir_if_exists(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(DbError::Io(e).into()),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests;
