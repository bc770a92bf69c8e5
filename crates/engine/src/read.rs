use anyhow::Result;
use cursor::RowCursor;
use std::sync::Arc;
use tracing::warn;

use crate::error::DbError;
use crate::partition::Partition;
use crate::predicate::Predicate;
use crate::rows::RowSet;
use crate::schema::Schema;
use crate::value::{parse_f64, Dest, Value};
use crate::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Extremum {
    Min,
    Max,
}

/// Rows of a table or partition together with the schema that names them.
struct Source {
    schema: Arc<Schema>,
    cursor: RowCursor,
}

impl Source {
    fn count(mut self, pred: &Predicate) -> i64 {
        let mut n = 0i64;
        while self.cursor.advance() {
            if pred.matches(self.cursor.values()) {
                n += 1;
            }
        }
        if let Some(e) = self.cursor.err() {
            warn!(error = %e, "count aborted by read error");
            return -1;
        }
        n
    }

    fn sum(mut self, pred: &Predicate, column: &str) -> Result<f64> {
        let idx = self.schema.index_of(column)?;
        let mut total = 0f64;
        while self.cursor.advance() {
            let row = self.cursor.values();
            if pred.matches(row) {
                total += field_f64(row, idx)?;
            }
        }
        self.finish()?;
        Ok(total)
    }

    fn extremum(
        mut self,
        pred: &Predicate,
        column: &str,
        which: Extremum,
    ) -> Result<Option<(f64, Vec<String>)>> {
        let idx = self.schema.index_of(column)?;
        let mut best: Option<(f64, Vec<String>)> = None;
        while self.cursor.advance() {
            if !pred.matches(self.cursor.values()) {
                continue;
            }
            let v = field_f64(self.cursor.values(), idx)?;
            let better = match &best {
                None => true,
                Some((b, _)) => match which {
                    Extremum::Min => v < *b,
                    Extremum::Max => v > *b,
                },
            };
            if better {
                best = Some((v, self.cursor.take_values()));
            }
        }
        self.finish()?;
        Ok(best)
    }

    fn select<'p>(self, pred: &Predicate<'p>, projection: Option<&[&str]>) -> Result<RowSet<'p>> {
        RowSet::new(self.cursor, pred.clone(), self.schema, projection)
    }

    fn select1(self, pred: &Predicate, projection: Option<&[&str]>, dests: &mut [Dest<'_>]) -> Result<()> {
        let mut rows = self.select(pred, projection)?;
        if rows.next() {
            return rows.scan(dests);
        }
        if let Some(e) = rows.take_err() {
            return Err(DbError::Codec(e).into());
        }
        Err(DbError::NoRecord.into())
    }

    fn finish(&mut self) -> Result<()> {
        match self.cursor.take_err() {
            Some(e) => Err(DbError::Codec(e).into()),
            None => Ok(()),
        }
    }
}

fn field_f64(row: &[String], idx: usize) -> Result<f64, DbError> {
    let field = row.get(idx).ok_or(DbError::ArgumentCount {
        expected: idx + 1,
        got: row.len(),
    })?;
    parse_f64(field)
}

fn store_extremum(found: Option<(f64, Vec<String>)>, mut out: Dest<'_>) -> Result<()> {
    // No matching row reports 0.
    let v = found.map_or(0.0, |(v, _)| v);
    out.decode(&Value::Float(v).to_field())?;
    Ok(())
}

impl Table {
    fn source(&self) -> Result<Source> {
        Ok(Source {
            schema: Arc::clone(&self.schema),
            cursor: self.cursor()?,
        })
    }

    /// Number of flushed rows matching `pred` across every partition, or
    /// `-1` if a file could not be listed or read.
    pub fn count(&self, pred: &Predicate) -> i64 {
        match self.source() {
            Ok(src) => src.count(pred),
            Err(e) => {
                warn!(table = self.name(), error = %e, "count failed to list files");
                -1
            }
        }
    }

    /// Sums `column` over the matching rows and stores the total in `out`.
    ///
    /// Every matching value must parse as a number.
    pub fn sum<'d>(&self, pred: &Predicate, column: &str, out: impl Into<Dest<'d>>) -> Result<()> {
        let total = self.source()?.sum(pred, column)?;
        out.into().decode(&Value::Float(total).to_field())?;
        Ok(())
    }

    /// Smallest numeric value of `column` among matching rows; `0` when no
    /// row matches.
    pub fn min<'d>(&self, pred: &Predicate, column: &str, out: impl Into<Dest<'d>>) -> Result<()> {
        store_extremum(self.source()?.extremum(pred, column, Extremum::Min)?, out.into())
    }

    /// Largest numeric value of `column` among matching rows; `0` when no
    /// row matches.
    pub fn max<'d>(&self, pred: &Predicate, column: &str, out: impl Into<Dest<'d>>) -> Result<()> {
        store_extremum(self.source()?.extremum(pred, column, Extremum::Max)?, out.into())
    }

    /// Like [`Table::min`] but also returns the row holding the minimum (the
    /// first such row in file order).
    pub fn min_row(&self, pred: &Predicate, column: &str) -> Result<Option<(f64, Vec<String>)>> {
        self.source()?.extremum(pred, column, Extremum::Min)
    }

    pub fn max_row(&self, pred: &Predicate, column: &str) -> Result<Option<(f64, Vec<String>)>> {
        self.source()?.extremum(pred, column, Extremum::Max)
    }

    /// Lazily yields matching rows across every partition.
    ///
    /// `projection` restricts what [`RowSet::scan`] decodes; unknown columns
    /// are rejected here.
    pub fn select_rows<'p>(
        &self,
        pred: &Predicate<'p>,
        projection: Option<&[&str]>,
    ) -> Result<RowSet<'p>> {
        self.source()?.select(pred, projection)
    }

    /// Decodes the first matching row into `dests`.
    ///
    /// # Errors
    ///
    /// [`DbError::NoRecord`] when nothing matches.
    pub fn select1_row(
        &self,
        pred: &Predicate,
        projection: Option<&[&str]>,
        dests: &mut [Dest<'_>],
    ) -> Result<()> {
        self.source()?.select1(pred, projection, dests)
    }
}

impl Partition {
    fn source(&self) -> Source {
        Source {
            schema: Arc::clone(&self.schema),
            cursor: self.cursor(),
        }
    }

    /// Number of flushed rows of this partition matching `pred`, `-1` on a
    /// read error.
    pub fn count(&self, pred: &Predicate) -> i64 {
        self.source().count(pred)
    }

    pub fn sum<'d>(&self, pred: &Predicate, column: &str, out: impl Into<Dest<'d>>) -> Result<()> {
        let total = self.source().sum(pred, column)?;
        out.into().decode(&Value::Float(total).to_field())?;
        Ok(())
    }

    pub fn min<'d>(&self, pred: &Predicate, column: &str, out: impl Into<Dest<'d>>) -> Result<()> {
        store_extremum(self.source().extremum(pred, column, Extremum::Min)?, out.into())
    }

    pub fn max<'d>(&self, pred: &Predicate, column: &str, out: impl Into<Dest<'d>>) -> Result<()> {
        store_extremum(self.source().extremum(pred, column, Extremum::Max)?, out.into())
    }

    pub fn min_row(&self, pred: &Predicate, column: &str) -> Result<Option<(f64, Vec<String>)>> {
        self.source().extremum(pred, column, Extremum::Min)
    }

    pub fn max_row(&self, pred: &Predicate, column: &str) -> Result<Option<(f64, Vec<String>)>> {
        self.source().extremum(pred, column, Extremum::Max)
    }

    /// Lazily yields the matching rows of this partition.
    pub fn query<'p>(&self, pred: &Predicate<'p>) -> Result<RowSet<'p>> {
        self.source().select(pred, None)
    }

    pub fn select_rows<'p>(
        &self,
        pred: &Predicate<'p>,
        projection: Option<&[&str]>,
    ) -> Result<RowSet<'p>> {
        self.source().select(pred, projection)
    }

    pub fn select1_row(
        &self,
        pred: &Predicate,
        projection: Option<&[&str]>,
        dests: &mut [Dest<'_>],
    ) -> Result<()> {
        self.source().select1(pred, projection, dests)
    }
}
