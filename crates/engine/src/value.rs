//! Conversion between typed values and the string fields stored on disk.

use std::fmt;
use std::str::FromStr;

use crate::error::DbError;

/// A typed value accepted by inserts, updates and upserts.
///
/// Every value is stored as its textual form; see [`Value::to_field`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Uint(u64),
    Float(f64),
    Float32(f32),
    Bool(bool),
    Str(String),
}

impl Value {
    /// Textual form written to a record field.
    ///
    /// Integers print in base 10, booleans as `true`/`false`, floats in the
    /// shortest form that parses back to the same value.
    pub fn to_field(&self) -> String {
        match self {
            Value::Int(v) => v.to_string(),
            Value::Uint(v) => v.to_string(),
            Value::Float(v) => v.to_string(),
            Value::Float32(v) => v.to_string(),
            Value::Bool(v) => v.to_string(),
            Value::Str(s) => s.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_field())
    }
}

macro_rules! value_from {
    ($variant:ident as $target:ty: $($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::$variant(v as $target)
            }
        })*
    };
}

value_from!(Int as i64: i8, i16, i32, i64, isize);
value_from!(Uint as u64: u8, u16, u32, u64, usize);

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float32(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Str(v.clone())
    }
}

/// Builds a `Vec<Value>` from heterogeneous literals.
///
/// ```
/// let row = engine::values![1, "user1", "class1"];
/// assert_eq!(row.len(), 3);
/// ```
#[macro_export]
macro_rules! values {
    ($($v:expr),* $(,)?) => {
        vec![$($crate::Value::from($v)),*]
    };
}

/// A typed destination a stored field is decoded into.
#[derive(Debug)]
pub enum Dest<'a> {
    Int(&'a mut i64),
    Int32(&'a mut i32),
    Uint(&'a mut u64),
    Uint32(&'a mut u32),
    Float(&'a mut f64),
    Bool(&'a mut bool),
    Str(&'a mut String),
}

impl Dest<'_> {
    /// Parses `src` and stores it in the destination.
    ///
    /// Booleans accept `1 t T TRUE true True` and `0 f F FALSE false False`.
    pub fn decode(&mut self, src: &str) -> Result<(), DbError> {
        let target = self.type_name();
        match self {
            Dest::Int(d) => **d = parse(src, target)?,
            Dest::Int32(d) => **d = parse(src, target)?,
            Dest::Uint(d) => **d = parse(src, target)?,
            Dest::Uint32(d) => **d = parse(src, target)?,
            Dest::Float(d) => **d = parse(src, target)?,
            Dest::Bool(d) => {
                **d = parse_bool(src).ok_or_else(|| conversion(src, target))?;
            }
            Dest::Str(d) => {
                d.clear();
                d.push_str(src);
            }
        }
        Ok(())
    }

    /// Name of the destination type, as reported in conversion errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Dest::Int(_) => "i64",
            Dest::Int32(_) => "i32",
            Dest::Uint(_) => "u64",
            Dest::Uint32(_) => "u32",
            Dest::Float(_) => "f64",
            Dest::Bool(_) => "bool",
            Dest::Str(_) => "string",
        }
    }
}

macro_rules! dest_from {
    ($($t:ty => $variant:ident),*) => {
        $(impl<'a> From<&'a mut $t> for Dest<'a> {
            fn from(v: &'a mut $t) -> Self {
                Dest::$variant(v)
            }
        })*
    };
}

dest_from!(i64 => Int, i32 => Int32, u64 => Uint, u32 => Uint32, f64 => Float, bool => Bool, String => Str);

/// Parses a boolean the way stored flags are written by other tools.
pub fn parse_bool(src: &str) -> Option<bool> {
    match src {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Parses a numeric field as `f64`, as aggregates do.
pub(crate) fn parse_f64(src: &str) -> Result<f64, DbError> {
    parse(src, "f64")
}

fn parse<T: FromStr>(src: &str, target: &'static str) -> Result<T, DbError> {
    src.parse().map_err(|_| conversion(src, target))
}

fn conversion(src: &str, target: &'static str) -> DbError {
    DbError::Conversion {
        value: src.to_string(),
        target,
    }
}
