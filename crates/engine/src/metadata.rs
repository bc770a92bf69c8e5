//! # Metadata - Table Definition File
//!
//! Persists the column list and storage options of a table (or a group of
//! tables) in a small ini-style text file next to its data directory.
//!
//! ## File Format
//!
//! ```text
//! # csvdb table metadata
//! [conf]
//! name = users
//! columns = id,name,class
//! useGzip = false
//! bufferSize = 10000
//! ```
//!
//! A group file carries an extra `tableNames` line listing its members (the
//! line is present, possibly empty, for every group).
//!
//! Lines starting with `#` or `;` are comments. Keys outside the `[conf]`
//! section are ignored. An unparsable `useGzip` or `bufferSize` falls back to
//! its default instead of failing the load.
//!
//! ## Crash Safety
//!
//! The file is rewritten through a `.tmp` sibling that is fsynced and then
//! renamed over the original.

use anyhow::{Context, Result};
use config::DEFAULT_BUFFER_SIZE;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::error::DbError;
use crate::value::parse_bool;

/// Section holding every metadata key.
pub const SECTION: &str = "conf";

/// Contents of a table or group metadata file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMeta {
    pub name: String,
    pub columns: Vec<String>,
    pub use_gzip: bool,
    pub buffer_size: usize,
    /// Member tables; `Some` only for groups.
    pub table_names: Option<Vec<String>>,
}

impl TableMeta {
    /// Reads and parses the metadata file at `path`.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read, a line inside `[conf]` is not a
    /// `key = value` pair, or `name`/`columns` are missing.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read metadata at {}", path.display()))?;
        let malformed = |reason: String| DbError::MalformedMetadata {
            path: path.to_path_buf(),
            reason,
        };

        let mut name = None;
        let mut columns = None;
        let mut use_gzip = false;
        let mut buffer_size = DEFAULT_BUFFER_SIZE;
        let mut table_names = None;
        let mut in_conf = false;

        for (line_num, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
                continue;
            }
            if let Some(section) = trimmed.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
                in_conf = section.trim() == SECTION;
                continue;
            }
            if !in_conf {
                continue;
            }

            let (key, value) = trimmed.split_once('=').ok_or_else(|| {
                malformed(format!(
                    "line {}: expected 'key = value', got {:?}",
                    line_num + 1,
                    trimmed
                ))
            })?;
            let value = value.trim();

            match key.trim() {
                "name" | "groupName" => name = Some(value.to_string()),
                "columns" => columns = Some(split_list(value)),
                "useGzip" => use_gzip = parse_bool(value).unwrap_or(false),
                "bufferSize" => {
                    buffer_size = value
                        .parse()
                        .ok()
                        .filter(|n| *n > 0)
                        .unwrap_or(DEFAULT_BUFFER_SIZE)
                }
                "tableNames" => table_names = Some(split_list(value)),
                _ => {}
            }
        }

        let name = name
            .filter(|n| !n.is_empty())
            .ok_or_else(|| malformed("missing table name".into()))?;
        let columns = columns
            .filter(|c| !c.is_empty())
            .ok_or_else(|| malformed("missing column list".into()))?;

        Ok(Self {
            name,
            columns,
            use_gzip,
            buffer_size,
            table_names,
        })
    }

    /// Writes the metadata to `path` atomically.
    ///
    /// If the rename fails (the target may be held open on some platforms)
    /// the file is overwritten in place instead.
    pub fn save(&self, path: &Path) -> Result<()> {
        let tmp_path = path.with_extension("ini.tmp");
        let contents = self.render();

        {
            let mut f = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp_path)
                .with_context(|| {
                    format!("failed to create metadata tmp at {}", tmp_path.display())
                })?;
            f.write_all(contents.as_bytes())?;
            f.sync_all()?;
        }

        if fs::rename(&tmp_path, path).is_err() {
            let mut f = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(path)
                .with_context(|| format!("failed to write metadata at {}", path.display()))?;
            f.write_all(contents.as_bytes())?;
            f.sync_all()?;
            let _ = fs::remove_file(&tmp_path);
        }
        Ok(())
    }

    pub fn is_group(&self) -> bool {
        self.table_names.is_some()
    }

    fn render(&self) -> String {
        let mut out = String::from("# csvdb table metadata\n");
        out.push_str(&format!("[{SECTION}]\n"));
        out.push_str(&format!("name = {}\n", self.name));
        out.push_str(&format!("columns = {}\n", self.columns.join(",")));
        out.push_str(&format!("useGzip = {}\n", self.use_gzip));
        out.push_str(&format!("bufferSize = {}\n", self.buffer_size));
        if let Some(names) = &self.table_names {
            out.push_str(&format!("tableNames = {}\n", names.join(",")));
        }
        out
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
