//! # Config - Runtime configuration
//!
//! Settings shared by the CsvDB binaries, read from environment variables
//! with fall-back defaults:
//!
//! ```text
//! CSVDB_DATA_DIR     base directory for tables      (default: "data")
//! CSVDB_BUFFER_SIZE  rows buffered before a flush   (default: 0 = engine default)
//! CSVDB_GZIP         gzip new tables                (default: "false")
//! CSVDB_LOG          tracing filter directive       (default: "warn")
//! ```
//!
//! Unparsable values fall back to the default instead of failing.

use std::path::PathBuf;

/// Rows buffered per table before an automatic flush when none is configured.
pub const DEFAULT_BUFFER_SIZE: usize = 10_000;
/// Partition id used by tables that are not explicitly partitioned.
pub const DEFAULT_PARTITION_ID: &str = "default";
/// Suffix of table / group metadata files (`<name>.tbl.ini`).
pub const TBL_INI_EXT: &str = "tbl.ini";

pub const ENV_DATA_DIR: &str = "CSVDB_DATA_DIR";
pub const ENV_BUFFER_SIZE: &str = "CSVDB_BUFFER_SIZE";
pub const ENV_GZIP: &str = "CSVDB_GZIP";
pub const ENV_LOG: &str = "CSVDB_LOG";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding `<name>.tbl.ini` files and table data directories.
    pub data_dir: PathBuf,
    /// Write-buffer capacity for newly created tables; `0` means
    /// [`DEFAULT_BUFFER_SIZE`].
    pub buffer_size: usize,
    /// Whether newly created tables store gzip-compressed partitions.
    pub use_gzip: bool,
    /// `tracing` filter directive, e.g. `"debug"` or `"engine=trace"`.
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            buffer_size: 0,
            use_gzip: false,
            log_filter: "warn".to_string(),
        }
    }
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name
    /// to its value.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            data_dir: lookup(ENV_DATA_DIR)
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            buffer_size: lookup(ENV_BUFFER_SIZE)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.buffer_size),
            use_gzip: lookup(ENV_GZIP)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.use_gzip),
            log_filter: lookup(ENV_LOG).unwrap_or(defaults.log_filter),
        }
    }

    /// Buffer capacity with `0` resolved to [`DEFAULT_BUFFER_SIZE`].
    pub fn effective_buffer_size(&self) -> usize {
        if self.buffer_size == 0 {
            DEFAULT_BUFFER_SIZE
        } else {
            self.buffer_size
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_when_nothing_set() {
        let cfg = Config::from_lookup(|_| None);
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.effective_buffer_size(), DEFAULT_BUFFER_SIZE);
    }

    #[test]
    fn reads_every_variable() {
        let cfg = Config::from_lookup(lookup_from(&[
            (ENV_DATA_DIR, "/tmp/tables"),
            (ENV_BUFFER_SIZE, "3"),
            (ENV_GZIP, "true"),
            (ENV_LOG, "debug"),
        ]));
        assert_eq!(cfg.data_dir, PathBuf::from("/tmp/tables"));
        assert_eq!(cfg.buffer_size, 3);
        assert_eq!(cfg.effective_buffer_size(), 3);
        assert!(cfg.use_gzip);
        assert_eq!(cfg.log_filter, "debug");
    }

    #[test]
    fn unparsable_values_fall_back() {
        let cfg = Config::from_lookup(lookup_from(&[
            (ENV_BUFFER_SIZE, "lots"),
            (ENV_GZIP, "yes please"),
        ]));
        assert_eq!(cfg.buffer_size, 0);
        assert!(!cfg.use_gzip);
    }
}
