//! Tables that share one schema and one metadata file.
//!
//! Group `events` under root `db/` keeps its metadata (including the member
//! list) in `db/events.tbl.ini`; member `clicks` stores its partitions in
//! `db/events/clicks/`.

use anyhow::Result;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::def::TableDef;
use crate::error::DbError;
use crate::metadata::TableMeta;
use crate::predicate::Predicate;
use crate::{checked_columns, effective_buffer_size, remove_dir_if_exists, remove_file_if_exists, Table};

#[derive(Debug)]
pub struct TableGroup {
    def: TableDef,
    columns: Vec<String>,
    use_gzip: bool,
    buffer_size: usize,
    table_names: BTreeSet<String>,
}

impl TableGroup {
    /// Creates an empty group and persists its metadata.
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
        fs::create_dir_all(root_dir.as_ref())?;

        let group = Self {
            def,
            columns: checked_columns(columns)?,
            use_gzip,
            buffer_size: effective_buffer_size(buffer_size),
            table_names: BTreeSet::new(),
        };
        group.save()?;
        fs::create_dir_all(group.def.data_dir())?;
        debug!(group = name, "created table group");
        Ok(group)
    }

    pub fn load<P: AsRef<Path>>(root_dir: P, name: &str) -> Result<Self> {
        let def = TableDef::init(name, root_dir.as_ref())?;
        Self::open(def.ini_file())
    }

    pub fn open<P: AsRef<Path>>(ini_path: P) -> Result<Self> {
        let ini_path = ini_path.as_ref();
        let def = TableDef::from_ini_path(ini_path)?;
        if !ini_path.exists() {
            return Err(DbError::TableNotFound(def.name().to_string()).into());
        }
        let meta = TableMeta::load(ini_path)?;
        let table_names = meta.table_names.ok_or_else(|| DbError::MalformedMetadata {
            path: ini_path.to_path_buf(),
            reason: format!("{} is not a table group", meta.name),
        })?;

        Ok(Self {
            def,
            columns: meta.columns,
            use_gzip: meta.use_gzip,
            buffer_size: meta.buffer_size,
            table_names: table_names.into_iter().collect(),
        })
    }

    pub fn name(&self) -> &str {
        self.def.name()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn data_dir(&self) -> &Path {
        self.def.data_dir()
    }

    /// Member names in sorted order.
    pub fn table_names(&self) -> Vec<&str> {
        self.table_names.iter().map(String::as_str).collect()
    }

    pub fn table_exists(&self, name: &str) -> bool {
        self.table_names.contains(name)
    }

    /// Adds member `name` and records it in the group metadata.
    pub fn create_table(&mut self, name: &str) -> Result<Table> {
        if self.table_exists(name) {
            return Err(DbError::TableExists(name.to_string()).into());
        }
        let def = TableDef::member(&self.def, name)?;
        fs::create_dir_all(def.data_dir())?;
        self.table_names.insert(name.to_string());
        self.save()?;
        debug!(group = self.name(), table = name, "added group member");
        Ok(self.member(def))
    }

    pub fn get_table(&self, name: &str) -> Result<Table> {
        if !self.table_exists(name) {
            return Err(DbError::TableNotFound(name.to_string()).into());
        }
        let def = TableDef::member(&self.def, name)?;
        fs::create_dir_all(def.data_dir())?;
        Ok(self.member(def))
    }

    pub fn create_table_if_not_exists(&mut self, name: &str) -> Result<Table> {
        if self.table_exists(name) {
            self.get_table(name)
        } else {
            self.create_table(name)
        }
    }

    /// Removes member `name` and its data.
    pub fn drop_table(&mut self, name: &str) -> Result<()> {
        self.get_table(name)?.drop_data()?;
        self.table_names.remove(name);
        self.save()?;
        debug!(group = self.name(), table = name, "dropped group member");
        Ok(())
    }

    /// Deletes every member's data and the group metadata.
    pub fn drop_group(self) -> Result<()> {
        remove_dir_if_exists(self.def.data_dir())?;
        remove_file_if_exists(self.def.ini_file())?;
        debug!(group = self.name(), "dropped table group");
        Ok(())
    }

    /// Matching rows summed over every member, `-1` if any member count
    /// fails.
    pub fn count(&self, pred: &Predicate) -> i64 {
        let mut total = 0;
        for name in &self.table_names {
            let n = match self.get_table(name) {
                Ok(t) => t.count(pred),
                Err(_) => -1,
            };
            if n < 0 {
                return -1;
            }
            total += n;
        }
        total
    }

    fn member(&self, def: TableDef) -> Table {
        Table::from_parts(def, self.columns.clone(), self.use_gzip, self.buffer_size)
    }

    fn save(&self) -> Result<()> {
        TableMeta {
            name: self.def.name().to_string(),
            columns: self.columns.clone(),
            use_gzip: self.use_gzip,
            buffer_size: self.buffer_size,
            table_names: Some(self.table_names.iter().cloned().collect()),
        }
        .save(self.def.ini_file())
    }
}
