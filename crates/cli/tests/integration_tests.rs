/// Integration tests for the csvdb shell binary.
/// Each test pipes a script into a fresh process and inspects stdout and the
/// files left in the data directory.
use std::fs;
use std::path::Path;
use tempfile::tempdir;

/// Runs `script` (followed by EXIT) through the shell and returns stdout.
fn run_cli(data_dir: &Path, extra_env: &[(&str, &str)], script: &str) -> String {
    use std::io::Write;
    use std::process::{Command, Stdio};

    let mut cmd = Command::new(env!("CARGO_BIN_EXE_cli"));
    cmd.env("CSVDB_DATA_DIR", data_dir)
        .env("CSVDB_LOG", "off")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    for (k, v) in extra_env {
        cmd.env(k, v);
    }
    let mut child = cmd.spawn().expect("Failed to spawn CLI");

    {
        let stdin = child.stdin.as_mut().expect("Failed to open stdin");
        stdin
            .write_all(script.as_bytes())
            .expect("Failed to write to stdin");
        stdin.write_all(b"EXIT\n").expect("Failed to write EXIT");
    }

    let output = child.wait_with_output().expect("Failed to read output");
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn test_create_insert_select() {
    let dir = tempdir().unwrap();
    let out = run_cli(
        dir.path(),
        &[],
        "CREATE users id,name,class\nINSERT 1,alice,class1\nINSERT 2,bob,class2\nFLUSH\nSELECT name class=class2\n",
    );

    assert!(out.contains("csvdb started"));
    assert!(out.contains("OK (2 buffered)"));
    assert!(out.contains("bob\n(1 rows)"));
    assert!(out.contains("bye"));
    assert!(dir.path().join("users.tbl.ini").is_file());
    assert_eq!(
        fs::read_to_string(dir.path().join("users").join("default.csv")).unwrap(),
        "1,alice,class1\n2,bob,class2\n"
    );
}

#[test]
fn test_buffer_size_from_env_triggers_flush() {
    let dir = tempdir().unwrap();
    let out = run_cli(
        dir.path(),
        &[("CSVDB_BUFFER_SIZE", "2")],
        "CREATE t x\nINSERT 1\nCOUNT\nINSERT 2\nCOUNT\n",
    );

    let counts: Vec<&str> = out
        .lines()
        .map(|l| l.trim_start_matches("> "))
        .filter(|l| l.chars().all(|c| c.is_ascii_digit()) && !l.is_empty())
        .collect();
    assert_eq!(counts, vec!["0", "2"]);
}

#[test]
fn test_gzip_from_env() {
    let dir = tempdir().unwrap();
    run_cli(
        dir.path(),
        &[("CSVDB_GZIP", "true")],
        "CREATE z a,b\nINSERT 1,2\nFLUSH\n",
    );

    let raw = fs::read(dir.path().join("z").join("default.csv.gz")).unwrap();
    assert_eq!(&raw[..2], &[0x1f, 0x8b]);
}

#[test]
fn test_state_survives_restart() {
    let dir = tempdir().unwrap();
    // no FLUSH: exiting flushes the buffer
    run_cli(dir.path(), &[], "CREATE t id,v\nINSERT 1,10\nINSERT 2,32\n");

    let out = run_cli(dir.path(), &[], "TABLES\nUSE t\nSUM v\n");
    assert!(out.contains("t\n"));
    assert!(out.contains("42"));
}

#[test]
fn test_errors_keep_session_alive() {
    let dir = tempdir().unwrap();
    let out = run_cli(dir.path(), &[], "COUNT\nFROB\nCREATE t x\nCOUNT\n");

    assert!(out.contains("ERR no table selected"));
    assert!(out.contains("ERR unknown command: FROB"));
    assert!(out.contains("bye"));
}

#[test]
fn test_drop_removes_files() {
    let dir = tempdir().unwrap();
    run_cli(dir.path(), &[], "CREATE t x\nINSERT 1\nFLUSH\nDROP t\n");

    assert!(!dir.path().join("t.tbl.ini").exists());
    assert!(!dir.path().join("t").exists());
}
