use crate::shell::{Reply, Shell};
use config::Config;
use std::path::Path;
use tempfile::tempdir;

fn shell(dir: &Path, buffer_size: usize) -> Shell {
    let config = Config {
        data_dir: dir.to_path_buf(),
        buffer_size,
        ..Config::default()
    };
    Shell::new(config).unwrap()
}

fn run(shell: &mut Shell, line: &str) -> String {
    match shell.execute(line).unwrap() {
        Reply::Text(t) => t,
        Reply::Exit => "<exit>".to_string(),
    }
}

#[test]
fn create_insert_flush_count() {
    let dir = tempdir().unwrap();
    let mut sh = shell(dir.path(), 100);

    assert_eq!(run(&mut sh, "CREATE users id,name,class"), "OK");
    assert_eq!(sh.current(), Some("users"));
    assert_eq!(run(&mut sh, "INSERT 1,alice,class1"), "OK (1 buffered)");
    assert_eq!(run(&mut sh, "COUNT"), "0");
    assert_eq!(run(&mut sh, "FLUSH"), "OK");
    assert_eq!(run(&mut sh, "COUNT"), "1");
    assert_eq!(run(&mut sh, "count name=alice"), "1");
    assert_eq!(run(&mut sh, "COUNT name=bob"), "0");
}

#[test]
fn aggregates_and_select() {
    let dir = tempdir().unwrap();
    let mut sh = shell(dir.path(), 100);
    run(&mut sh, "CREATE users id,name,class");
    for row in ["3,c,x", "1,a,y", "2,b,x"] {
        run(&mut sh, &format!("INSERT {row}"));
    }
    run(&mut sh, "FLUSH");

    assert_eq!(run(&mut sh, "SUM id"), "6");
    assert_eq!(run(&mut sh, "SUM id class=x"), "5");
    assert_eq!(run(&mut sh, "MIN id"), "1");
    assert_eq!(run(&mut sh, "MAX id class=y"), "1");

    assert_eq!(run(&mut sh, "SELECT name class=x"), "c\nb\n(2 rows)");
    assert_eq!(
        run(&mut sh, "SELECT id,name BY id:int DESC"),
        "3,c\n2,b\n1,a\n(3 rows)"
    );
    assert_eq!(run(&mut sh, "SELECT * name=zzz"), "(0 rows)");
}

#[test]
fn update_delete_upsert_truncate() {
    let dir = tempdir().unwrap();
    let mut sh = shell(dir.path(), 100);
    run(&mut sh, "CREATE users id,name,class");
    run(&mut sh, "INSERT 1,a,x");
    run(&mut sh, "INSERT 2,b,y");
    run(&mut sh, "FLUSH");

    assert_eq!(run(&mut sh, "UPDATE name=z class=x"), "OK (updated 1)");
    assert_eq!(run(&mut sh, "COUNT name=z"), "1");
    assert_eq!(run(&mut sh, "UPSERT id=3,name=c id=3"), "OK (inserted)");
    assert_eq!(run(&mut sh, "UPSERT name=cc id=3"), "OK (updated 1)");
    assert_eq!(run(&mut sh, "DELETE class=y"), "OK (deleted 1)");
    assert_eq!(run(&mut sh, "COUNT"), "2");
    assert_eq!(run(&mut sh, "TRUNCATE"), "OK");
    assert_eq!(run(&mut sh, "COUNT"), "0");
}

#[test]
fn tables_use_and_drop() {
    let dir = tempdir().unwrap();
    let mut sh = shell(dir.path(), 100);
    assert_eq!(run(&mut sh, "TABLES"), "(empty)");
    run(&mut sh, "CREATE a x");
    run(&mut sh, "CREATE b y");
    assert_eq!(run(&mut sh, "TABLES"), "a\nb");

    assert_eq!(run(&mut sh, "USE a"), "OK");
    assert_eq!(sh.current(), Some("a"));
    assert_eq!(run(&mut sh, "DROP a"), "OK");
    assert_eq!(sh.current(), None);
    assert_eq!(run(&mut sh, "TABLES"), "b");
    assert!(sh.database().table_exists("b"));
}

#[test]
fn partitions_lists_files() {
    let dir = tempdir().unwrap();
    let mut sh = shell(dir.path(), 100);
    run(&mut sh, "CREATE t x");
    assert_eq!(run(&mut sh, "PARTITIONS"), "(empty)");
    run(&mut sh, "INSERT 1");
    run(&mut sh, "FLUSH");
    assert_eq!(run(&mut sh, "PARTITIONS"), "default");
}

#[test]
fn errors_are_reported_not_fatal() {
    let dir = tempdir().unwrap();
    let mut sh = shell(dir.path(), 100);

    assert!(sh.execute("COUNT").is_err());
    assert!(sh.execute("FROB").is_err());
    assert!(sh.execute("USE ghost").is_err());
    run(&mut sh, "CREATE t x,y");
    assert!(sh.execute("INSERT 1").is_err());
    assert!(sh.execute("COUNT z=1").is_err());
    assert!(sh.execute("COUNT nonsense").is_err());
    assert!(sh.execute("CREATE t x").is_err());
    assert_eq!(run(&mut sh, ""), "");
    assert_eq!(run(&mut sh, "exit"), "<exit>");
}

#[test]
fn buffered_rows_are_flushed_when_shell_drops() {
    let dir = tempdir().unwrap();
    {
        let mut sh = shell(dir.path(), 100);
        run(&mut sh, "CREATE t x");
        run(&mut sh, "INSERT 1");
    }
    let mut sh = shell(dir.path(), 100);
    run(&mut sh, "USE t");
    assert_eq!(run(&mut sh, "COUNT"), "1");
}
