use anyhow::Result;
use config::{Config, TBL_INI_EXT};
use cursor::{dir_pattern, sorted_glob};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::def::TableDef;
use crate::error::DbError;
use crate::group::TableGroup;
use crate::metadata::TableMeta;
use crate::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Table,
    Group,
}

/// Registry of the tables and groups whose metadata files sit directly in a
/// base directory.
///
/// Table handles are not cached; every [`get_table`](Database::get_table)
/// returns a fresh handle with an empty buffer.
#[derive(Debug)]
pub struct Database {
    base_dir: PathBuf,
    entries: BTreeMap<String, EntryKind>,
}

impl Database {
    /// Opens (creating if needed) the database at `base_dir` and registers
    /// every `*.tbl.ini` file found there.
    ///
    /// Files whose names do not have the `<name>.tbl.ini` shape are skipped.
    /// A metadata file that cannot be parsed fails the open.
    pub fn open<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;

        let (_, files) = sorted_glob(&dir_pattern(&base_dir, &format!(".{TBL_INI_EXT}")))?;
        let mut entries = BTreeMap::new();
        for path in files {
            let def = match TableDef::from_ini_path(&path) {
                Ok(def) => def,
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "skipping metadata file");
                    continue;
                }
            };
            let kind = if TableMeta::load(&path)?.is_group() {
                EntryKind::Group
            } else {
                EntryKind::Table
            };
            entries.insert(def.name().to_string(), kind);
        }

        debug!(base_dir = %base_dir.display(), entries = entries.len(), "opened database");
        Ok(Self { base_dir, entries })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::open(&config.data_dir)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Names of every table and group, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn table_exists(&self, name: &str) -> bool {
        self.entries.get(name) == Some(&EntryKind::Table)
    }

    pub fn group_exists(&self, name: &str) -> bool {
        self.entries.get(name) == Some(&EntryKind::Group)
    }

    pub fn create_table(
        &mut self,
        name: &str,
        columns: &[&str],
        use_gzip: bool,
        buffer_size: usize,
    ) -> Result<Table> {
        if self.entries.contains_key(name) {
            return Err(DbError::TableExists(name.to_string()).into());
        }
        let table = Table::create(&self.base_dir, name, columns, use_gzip, buffer_size)?;
        self.entries.insert(name.to_string(), EntryKind::Table);
        Ok(table)
    }

    pub fn get_table(&self, name: &str) -> Result<Table> {
        if !self.table_exists(name) {
            return Err(DbError::TableNotFound(name.to_string()).into());
        }
        Table::load(&self.base_dir, name)
    }

    /// Returns the existing table, or creates it with the given layout. An
    /// existing table keeps its own columns and options.
    pub fn create_table_if_not_exists(
        &mut self,
        name: &str,
        columns: &[&str],
        use_gzip: bool,
        buffer_size: usize,
    ) -> Result<Table> {
        if self.table_exists(name) {
            self.get_table(name)
        } else {
            self.create_table(name, columns, use_gzip, buffer_size)
        }
    }

    pub fn create_group(
        &mut self,
        name: &str,
        columns: &[&str],
        use_gzip: bool,
        buffer_size: usize,
    ) -> Result<TableGroup> {
        if self.entries.contains_key(name) {
            return Err(DbError::TableExists(name.to_string()).into());
        }
        let group = TableGroup::create(&self.base_dir, name, columns, use_gzip, buffer_size)?;
        self.entries.insert(name.to_string(), EntryKind::Group);
        Ok(group)
    }

    pub fn group(&self, name: &str) -> Result<TableGroup> {
        if !self.group_exists(name) {
            return Err(DbError::TableNotFound(name.to_string()).into());
        }
        TableGroup::load(&self.base_dir, name)
    }

    /// Drops the table or group called `name` with all of its data.
    pub fn drop_table(&mut self, name: &str) -> Result<()> {
        match self.entries.get(name) {
            Some(EntryKind::Table) => Table::load(&self.base_dir, name)?.drop_table()?,
            Some(EntryKind::Group) => TableGroup::load(&self.base_dir, name)?.drop_group()?,
            None => return Err(DbError::TableNotFound(name.to_string()).into()),
        }
        self.entries.remove(name);
        Ok(())
    }

    pub fn drop_all(&mut self) -> Result<()> {
        let names: Vec<String> = self.entries.keys().cloned().collect();
        for name in names {
            self.drop_table(&name)?;
        }
        Ok(())
    }
}
