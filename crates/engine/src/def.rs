//! Where a table lives on disk.
//!
//! A table named `users` under root `db/` keeps its metadata in
//! `db/users.tbl.ini` and its partition files in `db/users/`.

use config::{DEFAULT_PARTITION_ID, TBL_INI_EXT};
use std::path::{Path, PathBuf};

use crate::error::DbError;

/// Identity and on-disk layout of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDef {
    name: String,
    data_dir: PathBuf,
    ini_file: PathBuf,
    member: bool,
}

impl TableDef {
    /// Layout for table `name` under `root_dir`.
    pub fn init(name: &str, root_dir: &Path) -> Result<Self, DbError> {
        validate_name(name)?;
        Ok(Self {
            name: name.to_string(),
            data_dir: root_dir.join(name),
            ini_file: root_dir.join(format!("{name}.{TBL_INI_EXT}")),
            member: false,
        })
    }

    /// Recovers the layout from a metadata path of the form
    /// `<dir>/<name>.tbl.ini`.
    pub fn from_ini_path(path: &Path) -> Result<Self, DbError> {
        let malformed = || DbError::MalformedPath(path.to_path_buf());

        let dir = path
            .parent()
            .filter(|d| !d.as_os_str().is_empty())
            .ok_or_else(malformed)?;
        let file_name = path.file_name().and_then(|n| n.to_str()).ok_or_else(malformed)?;

        let tokens: Vec<&str> = file_name.split('.').collect();
        if tokens.len() != 3 || format!("{}.{}", tokens[1], tokens[2]) != TBL_INI_EXT {
            return Err(malformed());
        }
        validate_name(tokens[0]).map_err(|_| malformed())?;

        Ok(Self {
            name: tokens[0].to_string(),
            data_dir: dir.join(tokens[0]),
            ini_file: path.to_path_buf(),
            member: false,
        })
    }

    /// Layout for member `name` of a group: data goes to a subdirectory of
    /// the group directory, metadata stays in the group's file.
    pub fn member(group: &TableDef, name: &str) -> Result<Self, DbError> {
        validate_name(name)?;
        Ok(Self {
            name: name.to_string(),
            data_dir: group.data_dir.join(name),
            ini_file: group.ini_file.clone(),
            member: true,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Metadata file. For a group member this is the group's file.
    pub fn ini_file(&self) -> &Path {
        &self.ini_file
    }

    /// Whether this table belongs to a group.
    pub fn is_member(&self) -> bool {
        self.member
    }

    /// Path of partition `id`.
    pub fn partition_path(&self, id: &str, use_gzip: bool) -> PathBuf {
        self.data_dir
            .join(format!("{id}{}", partition_suffix(use_gzip)))
    }

    /// Path of the default partition.
    pub fn default_path(&self, use_gzip: bool) -> PathBuf {
        self.partition_path(DEFAULT_PARTITION_ID, use_gzip)
    }
}

/// File name suffix shared by every partition file of a table.
pub fn partition_suffix(use_gzip: bool) -> &'static str {
    if use_gzip {
        ".csv.gz"
    } else {
        ".csv"
    }
}

/// Table and group names become file names and glob patterns.
pub fn validate_name(name: &str) -> Result<(), DbError> {
    let bad = name.is_empty()
        || name
            .chars()
            .any(|c| matches!(c, '.' | '*' | '?' | '[' | ']' | '/' | '\\'));
    if bad {
        return Err(DbError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Partition ids must not contain `.` or `*` (nor a path separator).
pub fn validate_partition_id(id: &str) -> Result<(), DbError> {
    let bad = id.is_empty() || id.chars().any(|c| matches!(c, '.' | '*' | '/' | '\\'));
    if bad {
        return Err(DbError::InvalidPartitionId(id.to_string()));
    }
    Ok(())
}

/// Column names are stored comma-joined on one metadata line.
pub fn validate_column(name: &str) -> Result<(), DbError> {
    let bad = name.trim().is_empty()
        || name != name.trim()
        || name.chars().any(|c| matches!(c, ',' | '\n' | '\r'));
    if bad {
        return Err(DbError::InvalidColumn(name.to_string()));
    }
    Ok(())
}
