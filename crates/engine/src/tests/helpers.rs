use crate::*;
use crate::values;
use anyhow::Result;
use codec::CsvReader;
use std::path::Path;
use std::thread;
use std::time::Duration;

pub const COLUMNS: [&str; 3] = ["id", "name", "class"];

pub fn users(root: &Path, buffer_size: usize) -> Result<Table> {
    Table::create(root, "users", &COLUMNS, false, buffer_size)
}

pub fn row(i: usize) -> Vec<Value> {
    values![i, format!("user{i}"), format!("class{}", i % 3)]
}

/// Inserts `(i, user<i>, class<i % 3>)` for every `i` in `ids` and flushes.
pub fn seed(table: &mut Table, ids: impl IntoIterator<Item = usize>) -> Result<()> {
    for i in ids {
        table.insert_row(None, &row(i))?;
    }
    table.flush()
}

pub fn read_file(path: &Path) -> Vec<Vec<String>> {
    let mut r = CsvReader::open(path).unwrap();
    let mut out = Vec::new();
    while let Some(rec) = r.next_record().unwrap() {
        out.push(rec);
    }
    out
}

pub fn rec(fields: &[&str]) -> Vec<String> {
    fields.iter().map(|s| s.to_string()).collect()
}

pub fn eq<'a>(table: &Table, column: &str, value: &str) -> Predicate<'a> {
    Predicate::column_eq(table.schema().index_of(column).unwrap(), value)
}

/// Keeps modification times of consecutive writes apart.
pub fn pause() {
    thread::sleep(Duration::from_millis(30));
}
