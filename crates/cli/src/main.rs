//! # CLI - csvdb Interactive Shell
//!
//! A REPL-style command-line interface over the flat-file table engine.
//! Reads commands from stdin, executes them, and prints results to stdout.
//! Works interactively and with piped scripts.
//!
//! ## Configuration
//!
//! ```text
//! CSVDB_DATA_DIR     database directory              (default: "data")
//! CSVDB_BUFFER_SIZE  rows buffered per flush         (default: 0 = 10000)
//! CSVDB_GZIP         gzip new tables                 (default: "false")
//! CSVDB_LOG          tracing filter, logs to stderr  (default: "warn")
//! ```
//!
//! ## Example
//!
//! ```text
//! $ cargo run -p cli
//! csvdb started (data_dir=data, buffer_size=10000, gzip=false)
//! > CREATE users id,name,class
//! OK
//! > INSERT 1,alice,class1
//! OK (1 buffered)
//! > FLUSH
//! OK
//! > SELECT name
//! alice
//! (1 rows)
//! > EXIT
//! bye
//! ```

mod shell;

use anyhow::Result;
use config::Config;
use shell::{Reply, Shell};
use std::io::{self, BufRead, Write};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let config = Config::from_env();

    let filter = EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    println!(
        "csvdb started (data_dir={}, buffer_size={}, gzip={})",
        config.data_dir.display(),
        config.effective_buffer_size(),
        config.use_gzip
    );
    let mut shell = Shell::new(config)?;
    println!(
        "{} tables. Type HELP for commands.",
        shell.database().names().len()
    );
    print!("> ");
    io::stdout().flush().ok();

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        match shell.execute(&line) {
            Ok(Reply::Text(text)) => {
                if !text.is_empty() {
                    println!("{}", text);
                }
            }
            Ok(Reply::Exit) => {
                println!("bye");
                break;
            }
            Err(e) => println!("ERR {}", e),
        }

        print!("> ");
        io::stdout().flush().ok();
    }

    // dropping the shell flushes rows still buffered in the selected table
    drop(shell);
    Ok(())
}

#[cfg(test)]
mod tests;
