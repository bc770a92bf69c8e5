use super::helpers::{pause, read_file, rec, row, seed, users};
use crate::*;
use crate::values;
use anyhow::Result;
use std::fs;
use tempfile::tempdir;

// --------------------- Buffering ---------------------

#[test]
fn buffered_rows_are_invisible_until_capacity() -> Result<()> {
    let dir = tempdir()?;
    let mut t = users(dir.path(), 3)?;

    t.insert_row(None, &row(1))?;
    assert_eq!(t.count(&Predicate::all()), 0);
    t.insert_row(None, &row(2))?;
    assert_eq!(t.count(&Predicate::all()), 0);
    assert_eq!(t.buffered(), 2);

    // third row fills the buffer and flushes it
    t.insert_row(None, &row(3))?;
    assert_eq!(t.buffered(), 0);
    assert_eq!(t.count(&Predicate::all()), 3);
    Ok(())
}

#[test]
fn explicit_flush_makes_rows_visible() -> Result<()> {
    let dir = tempdir()?;
    let mut t = users(dir.path(), 100)?;

    t.insert_row(None, &row(1))?;
    assert!(!t.path().exists());
    t.flush()?;

    assert_eq!(
        fs::read_to_string(t.path())?,
        "1,user1,class1\n"
    );
    assert_eq!(t.count(&Predicate::all()), 1);
    Ok(())
}

#[test]
fn second_flush_writes_nothing() -> Result<()> {
    let dir = tempdir()?;
    let mut t = users(dir.path(), 100)?;

    seed(&mut t, 1..=2)?;
    t.flush()?;
    t.flush()?;

    assert_eq!(read_file(t.path()).len(), 2);
    Ok(())
}

#[test]
fn flushes_append_in_insertion_order() -> Result<()> {
    let dir = tempdir()?;
    let mut t = users(dir.path(), 2)?;

    for i in 1..=5 {
        t.insert_row(None, &row(i))?;
    }
    t.flush()?;

    let ids: Vec<String> = read_file(t.path()).into_iter().map(|r| r[0].clone()).collect();
    assert_eq!(ids, vec!["1", "2", "3", "4", "5"]);
    Ok(())
}

#[test]
fn dropping_table_flushes_buffer() -> Result<()> {
    let dir = tempdir()?;
    {
        let mut t = users(dir.path(), 100)?;
        t.insert_row(None, &row(1))?;
        t.insert_row(None, &row(2))?;
    }

    let t = Table::load(dir.path(), "users")?;
    assert_eq!(t.count(&Predicate::all()), 2);
    Ok(())
}

#[test]
fn failed_flush_discards_buffer() -> Result<()> {
    let dir = tempdir()?;
    let mut t = users(dir.path(), 100)?;
    t.insert_row(None, &row(1))?;

    fs::remove_dir_all(t.def().data_dir())?;
    assert!(t.flush().is_err());
    assert_eq!(t.buffered(), 0);
    Ok(())
}

// --------------------- Row shape ---------------------

#[test]
fn wrong_value_count_is_rejected_and_not_buffered() -> Result<()> {
    let dir = tempdir()?;
    let mut t = users(dir.path(), 100)?;

    let err = t.insert_row(None, &values![1, "user1"]).unwrap_err();
    assert_eq!(error_kind(&err), ErrorKind::Config);
    assert_eq!(t.buffered(), 0);
    Ok(())
}

#[test]
fn named_columns_leave_other_fields_empty() -> Result<()> {
    let dir = tempdir()?;
    let mut t = users(dir.path(), 100)?;

    t.insert_row(Some(&["class", "id"][..]), &values!["class9", 9])?;
    t.flush()?;

    assert_eq!(read_file(t.path()), vec![rec(&["9", "", "class9"])]);
    Ok(())
}

#[test]
fn unknown_insert_column_is_rejected() -> Result<()> {
    let dir = tempdir()?;
    let mut t = users(dir.path(), 100)?;

    let err = t.insert_row(Some(&["age"][..]), &values![3]).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DbError>(),
        Some(DbError::UnknownColumn(c)) if c == "age"
    ));
    Ok(())
}

#[test]
fn fields_needing_quotes_round_trip() -> Result<()> {
    let dir = tempdir()?;
    let mut t = users(dir.path(), 100)?;

    t.insert_row(None, &values![1, "doe, john", "say \"hi\""])?;
    t.flush()?;

    let mut rows = t.select_rows(&Predicate::all(), None)?;
    assert!(rows.next());
    assert_eq!(rows.values(), rec(&["1", "doe, john", "say \"hi\""]).as_slice());
    Ok(())
}

// --------------------- Overwrite / bulk ---------------------

#[test]
fn flush_overwrite_replaces_file() -> Result<()> {
    let dir = tempdir()?;
    let mut t = users(dir.path(), 100)?;
    seed(&mut t, 1..=5)?;

    t.insert_row(None, &row(9))?;
    t.flush_overwrite()?;

    assert_eq!(read_file(t.path()), vec![rec(&["9", "user9", "class0"])]);
    Ok(())
}

#[test]
fn insert_rows_bypasses_buffer() -> Result<()> {
    let dir = tempdir()?;
    let t = users(dir.path(), 100)?;
    let mut p = t.partition("bulk")?;

    p.insert_rows(&[rec(&["1", "a", "x"]), rec(&["2", "b", "y"])], WriteMode::Append)?;
    assert_eq!(p.buffered(), 0);
    assert_eq!(p.count(&Predicate::all()), 2);

    assert!(p.insert_rows(&[rec(&["3", "c"])], WriteMode::Append).is_err());
    assert_eq!(p.count(&Predicate::all()), 2);

    p.insert_rows(&[rec(&["9", "z", "z"])], WriteMode::Truncate)?;
    assert_eq!(p.count(&Predicate::all()), 1);
    Ok(())
}

// --------------------- Gzip ---------------------

#[test]
fn gzip_table_writes_compressed_partition() -> Result<()> {
    let dir = tempdir()?;
    let mut t = Table::create(dir.path(), "zipped", &["id", "name", "class"], true, 100)?;

    seed(&mut t, 1..=3)?;
    pause();
    seed(&mut t, 4..=6)?;

    assert!(t.path().to_string_lossy().ends_with("default.csv.gz"));
    assert_eq!(&fs::read(t.path())?[..2], &[0x1f, 0x8b]);
    assert_eq!(t.count(&Predicate::all()), 6);
    Ok(())
}

#[test]
fn zero_buffer_size_uses_default() -> Result<()> {
    let dir = tempdir()?;
    let t = users(dir.path(), 0)?;
    assert_eq!(t.buffer_size(), config::DEFAULT_BUFFER_SIZE);

    let reloaded = Table::load(dir.path(), "users")?;
    assert_eq!(reloaded.buffer_size(), config::DEFAULT_BUFFER_SIZE);
    Ok(())
}
