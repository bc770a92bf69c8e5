//! Lazily evaluated result of a select.

use anyhow::Result;
use codec::CodecError;
use cursor::{quick_sort_by, RowCursor};
use std::cmp::Ordering;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

use crate::error::DbError;
use crate::predicate::Predicate;
use crate::schema::Schema;
use crate::value::{parse_f64, Dest};

/// How an `order_by` field is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Int,
    Float,
    Str,
}

impl FromStr for FieldType {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "int" | "integer" | "i64" => Ok(FieldType::Int),
            "float" | "number" | "f64" => Ok(FieldType::Float),
            "str" | "string" | "text" => Ok(FieldType::Str),
            _ => Err(DbError::Conversion {
                value: s.to_string(),
                target: "field type",
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl FromStr for Direction {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Direction::Asc),
            "desc" => Ok(Direction::Desc),
            _ => Err(DbError::Conversion {
                value: s.to_string(),
                target: "sort direction",
            }),
        }
    }
}

#[derive(Debug, Clone)]
enum SortKey {
    Int(i64),
    Float(f64),
    Str(String),
}

impl SortKey {
    fn parse(field: &str, ty: FieldType) -> Result<Self, DbError> {
        Ok(match ty {
            FieldType::Int => SortKey::Int(field.parse().map_err(|_| DbError::Conversion {
                value: field.to_string(),
                target: "i64",
            })?),
            FieldType::Float => SortKey::Float(parse_f64(field)?),
            FieldType::Str => SortKey::Str(field.to_string()),
        })
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Int(a), SortKey::Int(b)) => a.cmp(b),
            (SortKey::Float(a), SortKey::Float(b)) => a.total_cmp(b),
            (SortKey::Str(a), SortKey::Str(b)) => a.cmp(b),
            // keys of one column always share a type
            _ => Ordering::Equal,
        }
    }
}

fn compare_keys(a: &[SortKey], b: &[SortKey]) -> Ordering {
    a.iter()
        .zip(b)
        .map(|(x, y)| x.compare(y))
        .find(|o| *o != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

struct Ordered {
    rows: Vec<Vec<String>>,
    next: usize,
    current: Option<usize>,
}

/// Rows matching a predicate, produced one at a time from the underlying
/// files.
///
/// Call [`next`](RowSet::next) until it returns `false`, then check
/// [`err`](RowSet::err) to tell a read failure from the end of data.
/// [`order_by`](RowSet::order_by) drains the remaining rows into memory and
/// sorts them; `next` then walks the sorted rows.
pub struct RowSet<'p> {
    cursor: RowCursor,
    predicate: Predicate<'p>,
    schema: Arc<Schema>,
    projection: Option<Vec<usize>>,
    ordered: Option<Ordered>,
    closed: bool,
}

impl std::fmt::Debug for RowSet<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowSet")
            .field("cursor", &self.cursor)
            .field("predicate", &self.predicate)
            .field("projection", &self.projection)
            .field("ordered", &self.ordered.as_ref().map(|o| o.rows.len()))
            .field("closed", &self.closed)
            .finish()
    }
}

impl<'p> RowSet<'p> {
    pub(crate) fn new(
        cursor: RowCursor,
        predicate: Predicate<'p>,
        schema: Arc<Schema>,
        projection: Option<&[&str]>,
    ) -> Result<Self> {
        let projection = match projection {
            Some(cols) => Some(schema.indexes_of(cols)?),
            None => None,
        };
        Ok(Self {
            cursor,
            predicate,
            schema,
            projection,
            ordered: None,
            closed: false,
        })
    }

    /// Advances to the next matching row.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> bool {
        if self.closed {
            return false;
        }
        if let Some(o) = &mut self.ordered {
            if o.next < o.rows.len() {
                o.current = Some(o.next);
                o.next += 1;
                return true;
            }
            o.current = None;
            return false;
        }
        while self.cursor.advance() {
            if self.predicate.matches(self.cursor.values()) {
                return true;
            }
        }
        false
    }

    /// Every field of the current row, in schema order.
    pub fn values(&self) -> &[String] {
        match &self.ordered {
            Some(o) => o.current.map(|i| o.rows[i].as_slice()).unwrap_or_default(),
            None => self.cursor.values(),
        }
    }

    /// Fields of the current row restricted to the projection.
    pub fn projected(&self) -> Vec<&str> {
        let row = self.values();
        match &self.projection {
            Some(p) => p
                .iter()
                .map(|&i| row.get(i).map_or("", String::as_str))
                .collect(),
            None => row.iter().map(String::as_str).collect(),
        }
    }

    /// Names of the columns [`scan`](RowSet::scan) decodes, in order.
    pub fn columns(&self) -> Vec<&str> {
        let cols = self.schema.columns();
        match &self.projection {
            Some(p) => p.iter().map(|&i| cols[i].as_str()).collect(),
            None => cols.iter().map(String::as_str).collect(),
        }
    }

    /// Decodes the current row into `dests`, one per projected column (or
    /// one per schema column without a projection).
    ///
    /// A failed conversion aborts the scan; destinations before it may
    /// already hold new values.
    pub fn scan(&self, dests: &mut [Dest<'_>]) -> Result<()> {
        let row = self.values();
        if row.is_empty() {
            return Err(DbError::NoRecord.into());
        }
        let expected = self.projection.as_ref().map_or(self.schema.len(), Vec::len);
        if dests.len() != expected {
            return Err(DbError::ArgumentCount {
                expected,
                got: dests.len(),
            }
            .into());
        }
        for (i, dest) in dests.iter_mut().enumerate() {
            let pos = self.projection.as_ref().map_or(i, |p| p[i]);
            let field = row.get(pos).ok_or(DbError::ArgumentCount {
                expected: pos + 1,
                got: row.len(),
            })?;
            dest.decode(field)?;
        }
        Ok(())
    }

    /// Drains the rows not yet read and sorts them by `fields`, compared as
    /// `types`. Allowed once per row set.
    ///
    /// Ints and floats are parsed before sorting; an unparsable field fails
    /// the call.
    pub fn order_by(
        &mut self,
        fields: &[&str],
        types: &[FieldType],
        direction: Direction,
    ) -> Result<()> {
        if self.ordered.is_some() {
            return Err(DbError::OrderByApplied.into());
        }
        if fields.len() != types.len() {
            return Err(DbError::ArgumentCount {
                expected: fields.len(),
                got: types.len(),
            }
            .into());
        }
        let idxs = self.schema.indexes_of(fields)?;

        let mut rows = Vec::new();
        while self.next() {
            rows.push(self.cursor.take_values());
        }
        if let Some(e) = self.cursor.take_err() {
            return Err(DbError::Codec(e).into());
        }

        let mut keys = rows
            .iter()
            .map(|row| {
                idxs.iter()
                    .zip(types)
                    .map(|(&i, &ty)| SortKey::parse(row.get(i).map_or("", String::as_str), ty))
                    .collect::<Result<Vec<_>, DbError>>()
            })
            .collect::<Result<Vec<_>, DbError>>()?;

        quick_sort_by(&mut keys, &mut rows, |a, b| match direction {
            Direction::Asc => compare_keys(a, b),
            Direction::Desc => compare_keys(b, a),
        });
        debug!(rows = rows.len(), ?fields, ?direction, "ordered row set");

        self.ordered = Some(Ordered {
            rows,
            next: 0,
            current: None,
        });
        Ok(())
    }

    /// Read error that ended iteration early, if any.
    pub fn err(&self) -> Option<&CodecError> {
        self.cursor.err()
    }

    pub fn take_err(&mut self) -> Option<CodecError> {
        self.cursor.take_err()
    }

    /// Drains the remaining rows, projected.
    pub fn fetch_all(&mut self) -> Result<Vec<Vec<String>>> {
        let mut out = Vec::new();
        while self.next() {
            out.push(self.projected().into_iter().map(str::to_string).collect());
        }
        if let Some(e) = self.take_err() {
            return Err(DbError::Codec(e).into());
        }
        Ok(out)
    }

    /// Releases the open file. Further calls to `next` return `false`.
    pub fn close(&mut self) {
        self.cursor.close();
        self.ordered = None;
        self.closed = true;
    }
}
