//! Command interpreter behind the interactive shell.

use anyhow::{anyhow, bail, Result};
use config::Config;
use engine::{Database, Direction, FieldType, Predicate, Table, Value};
use tracing::debug;

/// Result of one shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Text to print; the session continues.
    Text(String),
    /// The session ends.
    Exit,
}

pub const HELP: &str = "\
CREATE name col1,col2,...      create a table and use it
USE name                       switch to an existing table
INSERT v1,v2,...               buffer one row
FLUSH                          write buffered rows
COUNT [col=value]              count flushed rows
SUM|MIN|MAX col [col=value]    aggregate a numeric column
SELECT cols|* [col=value] [BY col[:int|float|str] [ASC|DESC]]
UPDATE a=1,b=2 [col=value]     change matching rows
DELETE [col=value]             remove matching rows
UPSERT a=1,b=2 col=value       update matching rows or insert one
TRUNCATE                       remove every row
PARTITIONS                     list partition files of the table
TABLES                         list tables
DROP name                      drop a table
EXIT                           quit";

/// Executes shell commands against a [`Database`], keeping one table
/// selected.
pub struct Shell {
    db: Database,
    config: Config,
    current: Option<Table>,
}

impl Shell {
    pub fn new(config: Config) -> Result<Self> {
        let db = Database::from_config(&config)?;
        Ok(Self {
            db,
            config,
            current: None,
        })
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Name of the selected table.
    pub fn current(&self) -> Option<&str> {
        self.current.as_ref().map(Table::name)
    }

    /// Runs one command line. Blank lines produce empty text.
    pub fn execute(&mut self, line: &str) -> Result<Reply> {
        let line = line.trim();
        let (cmd, rest) = match line.split_once(char::is_whitespace) {
            Some((cmd, rest)) => (cmd, rest.trim()),
            None => (line, ""),
        };
        if cmd.is_empty() {
            return Ok(Reply::Text(String::new()));
        }
        debug!(command = cmd, "executing");

        let args: Vec<&str> = rest.split_whitespace().collect();
        let text = match cmd.to_uppercase().as_str() {
            "CREATE" => self.create(&args)?,
            "USE" => self.use_table(&args)?,
            "INSERT" => self.insert(rest)?,
            "FLUSH" => {
                self.table_mut()?.flush()?;
                "OK".to_string()
            }
            "COUNT" => {
                let t = self.table()?;
                let pred = filter(t, args.first().copied())?;
                t.count(&pred).to_string()
            }
            "SUM" | "MIN" | "MAX" => self.aggregate(cmd, &args)?,
            "SELECT" => self.select(&args)?,
            "UPDATE" => self.update(&args)?,
            "DELETE" => {
                let t = self.table_mut()?;
                let pred = filter(t, args.first().copied())?;
                let stats = t.delete(&pred)?;
                format!("OK (deleted {})", stats.matched)
            }
            "UPSERT" => self.upsert(&args)?,
            "TRUNCATE" => {
                self.table_mut()?.truncate()?;
                "OK".to_string()
            }
            "PARTITIONS" => {
                let ids = self.table()?.partition_ids()?;
                list(&ids)
            }
            "TABLES" => list(&self.db.names()),
            "DROP" => self.drop_table(&args)?,
            "HELP" => HELP.to_string(),
            "EXIT" | "QUIT" => return Ok(Reply::Exit),
            other => bail!("unknown command: {}", other),
        };
        Ok(Reply::Text(text))
    }

    fn table(&self) -> Result<&Table> {
        self.current
            .as_ref()
            .ok_or_else(|| anyhow!("no table selected (CREATE or USE one first)"))
    }

    fn table_mut(&mut self) -> Result<&mut Table> {
        self.current
            .as_mut()
            .ok_or_else(|| anyhow!("no table selected (CREATE or USE one first)"))
    }

    fn create(&mut self, args: &[&str]) -> Result<String> {
        let (name, columns) = match args {
            [name, columns] => (*name, columns.split(',').collect::<Vec<_>>()),
            _ => bail!("usage: CREATE name col1,col2,..."),
        };
        // select the new table only once it exists
        let table = self
            .db
            .create_table(name, &columns, self.config.use_gzip, self.config.buffer_size)?;
        self.current = Some(table);
        Ok("OK".to_string())
    }

    fn use_table(&mut self, args: &[&str]) -> Result<String> {
        let name = match args {
            [name] => *name,
            _ => bail!("usage: USE name"),
        };
        let table = self.db.get_table(name)?;
        self.current = Some(table);
        Ok("OK".to_string())
    }

    fn insert(&mut self, rest: &str) -> Result<String> {
        if rest.is_empty() {
            bail!("usage: INSERT v1,v2,...");
        }
        let values: Vec<Value> = rest.split(',').map(|v| Value::from(v.trim())).collect();
        let t = self.table_mut()?;
        t.insert_row(None, &values)?;
        Ok(format!("OK ({} buffered)", t.buffered()))
    }

    fn aggregate(&self, cmd: &str, args: &[&str]) -> Result<String> {
        let t = self.table()?;
        let column = match args.first() {
            Some(c) => *c,
            None => bail!("usage: {} col [col=value]", cmd.to_uppercase()),
        };
        let pred = filter(t, args.get(1).copied())?;
        let mut out = 0f64;
        match cmd.to_uppercase().as_str() {
            "SUM" => t.sum(&pred, column, &mut out)?,
            "MIN" => t.min(&pred, column, &mut out)?,
            _ => t.max(&pred, column, &mut out)?,
        }
        Ok(Value::Float(out).to_field())
    }

    fn select(&self, args: &[&str]) -> Result<String> {
        let t = self.table()?;
        let (cols, rest) = match args.split_first() {
            Some((cols, rest)) => (*cols, rest),
            None => bail!("usage: SELECT cols|* [col=value] [BY col[:type] [ASC|DESC]]"),
        };
        let projection: Option<Vec<&str>> = (cols != "*").then(|| cols.split(',').collect());

        let by = rest.iter().position(|a| a.eq_ignore_ascii_case("BY"));
        let (filter_args, order_args) = match by {
            Some(i) => (&rest[..i], &rest[i + 1..]),
            None => (rest, &[][..]),
        };
        let pred = filter(t, filter_args.first().copied())?;

        let mut rows = t.select_rows(&pred, projection.as_deref())?;
        if let Some((field, dir)) = order_args.split_first() {
            let (field, ty) = match field.split_once(':') {
                Some((f, ty)) => (f, ty.parse::<FieldType>()?),
                None => (*field, FieldType::Str),
            };
            let direction = match dir.first() {
                Some(d) => d.parse::<Direction>()?,
                None => Direction::Asc,
            };
            rows.order_by(&[field], &[ty], direction)?;
        }

        let rows = rows.fetch_all()?;
        let mut out: Vec<String> = rows.iter().map(|r| r.join(",")).collect();
        out.push(format!("({} rows)", rows.len()));
        Ok(out.join("\n"))
    }

    fn update(&mut self, args: &[&str]) -> Result<String> {
        let t = self.table_mut()?;
        let assignments = match args.first() {
            Some(a) => assignments(a)?,
            None => bail!("usage: UPDATE a=1,b=2 [col=value]"),
        };
        let pred = filter(t, args.get(1).copied())?;
        let updates = as_updates(&assignments);
        let stats = t.update(&pred, &updates)?;
        Ok(format!("OK (updated {})", stats.matched))
    }

    fn upsert(&mut self, args: &[&str]) -> Result<String> {
        let t = self.table_mut()?;
        let (assignments, cond) = match args {
            [a, cond] => (assignments(a)?, *cond),
            _ => bail!("usage: UPSERT a=1,b=2 col=value"),
        };
        let pred = filter(t, Some(cond))?;
        let stats = t.upsert(&pred, &as_updates(&assignments))?;
        if stats.inserted {
            Ok("OK (inserted)".to_string())
        } else {
            Ok(format!("OK (updated {})", stats.matched))
        }
    }

    fn drop_table(&mut self, args: &[&str]) -> Result<String> {
        let name = match args {
            [name] => *name,
            _ => bail!("usage: DROP name"),
        };
        if self.current() == Some(name) {
            self.current = None;
        }
        self.db.drop_table(name)?;
        Ok("OK".to_string())
    }
}

/// `col=value` equality filter; no argument matches every row.
fn filter(table: &Table, arg: Option<&str>) -> Result<Predicate<'static>> {
    let arg = match arg {
        Some(a) => a,
        None => return Ok(Predicate::all()),
    };
    let (col, value) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("expected col=value, got {:?}", arg))?;
    let idx = table.schema().index_of(col)?;
    Ok(Predicate::column_eq(idx, value))
}

fn assignments(arg: &str) -> Result<Vec<(String, String)>> {
    arg.split(',')
        .map(|pair| {
            pair.split_once('=')
                .map(|(c, v)| (c.to_string(), v.to_string()))
                .ok_or_else(|| anyhow!("expected col=value, got {:?}", pair))
        })
        .collect()
}

fn as_updates(assignments: &[(String, String)]) -> Vec<(&str, Value)> {
    assignments
        .iter()
        .map(|(c, v)| (c.as_str(), Value::from(v)))
        .collect()
}

fn list<S: AsRef<str>>(items: &[S]) -> String {
    if items.is_empty() {
        return "(empty)".to_string();
    }
    items
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("\n")
}
