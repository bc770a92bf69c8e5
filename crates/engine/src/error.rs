//! Error taxonomy of the table engine.
//!
//! Engine operations return [`anyhow::Result`]; failures raised by the engine
//! itself are [`DbError`] values and can be classified with [`error_kind`].

use codec::CodecError;
use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of a [`DbError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed metadata, unknown column, argument mismatch, bad identifier.
    Config,
    /// Missing table, group or record.
    NotFound,
    /// File open/read/write or decode failure.
    Io,
    /// A string could not be converted to the requested type.
    Conversion,
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("not a proper metadata path: {}", .0.display())]
    MalformedPath(PathBuf),

    #[error("malformed metadata in {}: {reason}", .path.display())]
    MalformedMetadata { path: PathBuf, reason: String },

    #[error("invalid table name {0:?}")]
    InvalidName(String),

    #[error("invalid column name {0:?}")]
    InvalidColumn(String),

    #[error("column {0} does not exist")]
    UnknownColumn(String),

    #[error("got {got} values while {expected} were expected")]
    ArgumentCount { expected: usize, got: usize },

    #[error("invalid partition id {0:?}")]
    InvalidPartitionId(String),

    #[error("order by was already applied to this row set")]
    OrderByApplied,

    #[error("table {0} already exists")]
    TableExists(String),

    #[error("table {0} not found")]
    TableNotFound(String),

    #[error("no record found")]
    NoRecord,

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot convert {value:?} to {target}")]
    Conversion { value: String, target: &'static str },
}

impl DbError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DbError::MalformedPath(_)
            | DbError::MalformedMetadata { .. }
            | DbError::InvalidName(_)
            | DbError::InvalidColumn(_)
            | DbError::UnknownColumn(_)
            | DbError::ArgumentCount { .. }
            | DbError::InvalidPartitionId(_)
            | DbError::OrderByApplied
            | DbError::TableExists(_) => ErrorKind::Config,
            DbError::TableNotFound(_) | DbError::NoRecord => ErrorKind::NotFound,
            DbError::Codec(_) | DbError::Io(_) => ErrorKind::Io,
            DbError::Conversion { .. } => ErrorKind::Conversion,
        }
    }
}

/// Classifies an error returned by an engine operation.
///
/// Errors that did not originate as a [`DbError`] come from the file layer
/// and are reported as [`ErrorKind::Io`].
pub fn error_kind(err: &anyhow::Error) -> ErrorKind {
    err.downcast_ref::<DbError>()
        .map(DbError::kind)
        .unwrap_or(ErrorKind::Io)
}
