//! File listing ordered by modification time.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use crate::sort::quick_sort_by;

/// Lists the regular files matching `pattern`, oldest modification time first.
///
/// Returns the modification times (nanoseconds since the Unix epoch) and the
/// paths as two parallel vectors. A pattern that matches nothing yields two
/// empty vectors.
pub fn sorted_glob(pattern: &str) -> Result<(Vec<i64>, Vec<PathBuf>)> {
    let entries =
        glob::glob(pattern).with_context(|| format!("invalid file pattern {:?}", pattern))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?;
        if path.is_file() {
            files.push(path);
        }
    }

    let mut epochs = files
        .iter()
        .map(|p| modified_nanos(p))
        .collect::<Result<Vec<_>>>()?;

    quick_sort_by(&mut epochs, &mut files, |a: &i64, b: &i64| a.cmp(b));
    Ok((epochs, files))
}

/// Pattern matching every file in `dir` whose name ends with `suffix`.
pub fn dir_pattern(dir: &Path, suffix: &str) -> String {
    format!(
        "{}/*{}",
        glob::Pattern::escape(&dir.to_string_lossy()),
        glob::Pattern::escape(suffix)
    )
}

fn modified_nanos(path: &Path) -> Result<i64> {
    let modified = fs::metadata(path)
        .and_then(|m| m.modified())
        .with_context(|| format!("failed to stat {}", path.display()))?;
    let since_epoch = modified.duration_since(UNIX_EPOCH).unwrap_or_default();
    Ok(i64::try_from(since_epoch.as_nanos()).unwrap_or(i64::MAX))
}
