use super::helpers::{eq, pause, rec, seed, users};
use crate::*;
use crate::values;
use anyhow::Result;
use std::fs;
use tempfile::tempdir;

// --------------------- count ---------------------

#[test]
fn count_empty_table_is_zero() -> Result<()> {
    let dir = tempdir()?;
    let t = users(dir.path(), 10)?;
    assert_eq!(t.count(&Predicate::all()), 0);
    Ok(())
}

#[test]
fn count_with_predicate() -> Result<()> {
    let dir = tempdir()?;
    let mut t = users(dir.path(), 100)?;
    seed(&mut t, 1..=10)?;

    assert_eq!(t.count(&Predicate::all()), 10);
    assert_eq!(t.count(&eq(&t, "class", "class1")), 4);
    assert_eq!(t.count(&eq(&t, "name", "nobody")), 0);
    Ok(())
}

#[test]
fn count_is_minus_one_on_unreadable_file() -> Result<()> {
    let dir = tempdir()?;
    let mut t = users(dir.path(), 100)?;
    seed(&mut t, 1..=3)?;
    pause();
    fs::write(t.def().data_dir().join("broken.csv"), "1,a,b\n2,c\n")?;

    assert_eq!(t.count(&Predicate::all()), -1);
    Ok(())
}

// --------------------- sum ---------------------

#[test]
fn sum_into_float_and_int() -> Result<()> {
    let dir = tempdir()?;
    let mut t = users(dir.path(), 100)?;
    seed(&mut t, 1..=5)?;

    let mut total = 0f64;
    t.sum(&Predicate::all(), "id", &mut total)?;
    assert_eq!(total, 15.0);

    let mut total = 0i64;
    t.sum(&eq(&t, "class", "class1"), "id", &mut total)?;
    assert_eq!(total, 1 + 4);
    Ok(())
}

#[test]
fn sum_without_rows_is_zero() -> Result<()> {
    let dir = tempdir()?;
    let t = users(dir.path(), 100)?;
    let mut total = -1f64;
    t.sum(&Predicate::all(), "id", &mut total)?;
    assert_eq!(total, 0.0);
    Ok(())
}

#[test]
fn sum_rejects_unknown_column_and_text() -> Result<()> {
    let dir = tempdir()?;
    let mut t = users(dir.path(), 100)?;
    seed(&mut t, 1..=2)?;

    let mut total = 0f64;
    let err = t.sum(&Predicate::all(), "age", &mut total).unwrap_err();
    assert_eq!(error_kind(&err), ErrorKind::Config);

    let err = t.sum(&Predicate::all(), "name", &mut total).unwrap_err();
    assert_eq!(error_kind(&err), ErrorKind::Conversion);
    Ok(())
}

#[test]
fn sum_parses_only_matching_rows() -> Result<()> {
    let dir = tempdir()?;
    let mut t = users(dir.path(), 100)?;
    seed(&mut t, 1..=2)?;
    t.insert_row(None, &values!["n/a", "ghost", "none"])?;
    t.flush()?;

    let mut total = 0f64;
    let numeric = Predicate::new(|r| r[2] != "none");
    t.sum(&numeric, "id", &mut total)?;
    assert_eq!(total, 3.0);
    Ok(())
}

// --------------------- min / max ---------------------

#[test]
fn min_and_max() -> Result<()> {
    let dir = tempdir()?;
    let mut t = users(dir.path(), 100)?;
    seed(&mut t, [7, 3, 9, 5])?;

    let (mut lo, mut hi) = (0i64, 0i64);
    t.min(&Predicate::all(), "id", &mut lo)?;
    t.max(&Predicate::all(), "id", &mut hi)?;
    assert_eq!((lo, hi), (3, 9));

    let mut lo = 0f64;
    t.min(&eq(&t, "class", "class1"), "id", &mut lo)?;
    assert_eq!(lo, 7.0);
    Ok(())
}

#[test]
fn min_max_without_match_store_zero() -> Result<()> {
    let dir = tempdir()?;
    let mut t = users(dir.path(), 100)?;
    seed(&mut t, 1..=3)?;

    let mut v = 42i64;
    t.max(&eq(&t, "name", "nobody"), "id", &mut v)?;
    assert_eq!(v, 0);
    Ok(())
}

#[test]
fn min_row_returns_holding_row() -> Result<()> {
    let dir = tempdir()?;
    let mut t = users(dir.path(), 100)?;
    seed(&mut t, [4, 2, 8])?;

    let (v, row) = t.min_row(&Predicate::all(), "id")?.unwrap();
    assert_eq!(v, 2.0);
    assert_eq!(row, rec(&["2", "user2", "class2"]));

    let (v, row) = t.max_row(&Predicate::all(), "id")?.unwrap();
    assert_eq!(v, 8.0);
    assert_eq!(row[1], "user8");

    assert!(t.max_row(&eq(&t, "name", "x"), "id")?.is_none());
    Ok(())
}

#[test]
fn fractional_extremum_into_int_fails() -> Result<()> {
    let dir = tempdir()?;
    let mut t = users(dir.path(), 100)?;
    t.insert_row(None, &values![2.5, "a", "b"])?;
    t.flush()?;

    let mut v = 0i64;
    let err = t.max(&Predicate::all(), "id", &mut v).unwrap_err();
    assert_eq!(error_kind(&err), ErrorKind::Conversion);
    Ok(())
}

// --------------------- select1 ---------------------

#[test]
fn select1_decodes_first_match() -> Result<()> {
    let dir = tempdir()?;
    let mut t = users(dir.path(), 100)?;
    seed(&mut t, 1..=6)?;

    let mut id = 0i64;
    let mut name = String::new();
    t.select1_row(
        &eq(&t, "class", "class2"),
        Some(&["id", "name"][..]),
        &mut [Dest::from(&mut id), Dest::from(&mut name)],
    )?;
    assert_eq!((id, name.as_str()), (2, "user2"));
    Ok(())
}

#[test]
fn select1_without_match_is_not_found() -> Result<()> {
    let dir = tempdir()?;
    let mut t = users(dir.path(), 100)?;
    seed(&mut t, 1..=2)?;

    let mut id = 0i64;
    let err = t
        .select1_row(&eq(&t, "name", "nobody"), Some(&["id"][..]), &mut [Dest::from(&mut id)])
        .unwrap_err();
    assert!(matches!(err.downcast_ref::<DbError>(), Some(DbError::NoRecord)));
    assert_eq!(error_kind(&err), ErrorKind::NotFound);
    Ok(())
}

// --------------------- gzip ---------------------

#[test]
fn gzip_and_plain_tables_answer_alike() -> Result<()> {
    let dir = tempdir()?;
    let mut plain = users(dir.path(), 4)?;
    let mut zipped = Table::create(dir.path(), "zipped", &super::helpers::COLUMNS, true, 4)?;
    seed(&mut plain, 1..=10)?;
    seed(&mut zipped, 1..=10)?;

    assert_eq!(plain.count(&Predicate::all()), zipped.count(&Predicate::all()));

    let (mut a, mut b) = (0f64, 0f64);
    plain.sum(&Predicate::all(), "id", &mut a)?;
    zipped.sum(&Predicate::all(), "id", &mut b)?;
    assert_eq!(a, b);

    let a = plain.select_rows(&Predicate::all(), None)?.fetch_all()?;
    let b = zipped.select_rows(&Predicate::all(), None)?.fetch_all()?;
    assert_eq!(a, b);
    Ok(())
}
