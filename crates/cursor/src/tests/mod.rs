
use codec::{CsvWriter, WriteMode};
use std::path::Path;

pub(crate) fn write_rows(path: &Path, rows: &[&[&str]]) {
    let mut w = CsvWriter::open(path, WriteMode::Append).unwrap();
    for row in rows {
        let rec: Vec<String> = row.iter().map(|s| s.to_string()).collect();
        w.write_record(&rec).unwrap();
    }
    w.close().unwrap();
}

pub(crate) fn rec(fields: &[&str]) -> Vec<String> {
    fields.iter().map(|s| s.to_string()).collect()
}
