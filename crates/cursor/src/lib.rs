//! # Cursor - Multi-file Row Cursor
//!
//! Sequential, forward-only iteration over the rows of one or more record
//! files, plus the file-ordering utilities that decide in which order a
//! partitioned table's files are visited.
//!
//! ## Layout
//!
//! ```text
//! sorted_glob(pattern) ──> [p1.csv, p2.csv, p3.csv]   (oldest mtime first)
//!                                   |
//!                                   v
//!                 RowCursor: p1 rows.. -> p2 rows.. -> p3 rows.. -> EXHAUSTED
//! ```
//!
//! Only one file is open at any time. A file that has been read to the end
//! is closed and never reopened during the same pass.
//!
//! ## Modules
//!
//! | Module     | Purpose                                              |
//! |------------|------------------------------------------------------|
//! | [`sort`]   | in-place quicksort over parallel key/payload slices   |
//! | [`listing`] | pattern listing ordered by modification time         |
//! | [`cursor`] | the [`RowCursor`] state machine                       |

pub mod cursor;
pub mod listing;
pub mod sort;

pub use cursor::{CursorState, RowCursor};
pub use listing::{dir_pattern, sorted_glob};
pub use sort::quick_sort_by;

#[cfg(test)]
mod tests;
