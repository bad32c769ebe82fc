//! Storage-native record representation
//!
//! A [`Record`] is the engine-facing shape of one row: an ordered
//! column → [`Value`] map. Mappers convert domain objects to and from
//! records; the engine binds record values into its own statement
//! parameters. Values cover SQLite's storage classes.

use crate::error::{Result, RunnelError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single storage value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Result<i64> {
        match self {
            Value::Integer(n) => Ok(*n),
            other => Err(RunnelError::Mapping(format!(
                "expected integer value, got {:?}",
                other
            ))),
        }
    }

    pub fn as_f64(&self) -> Result<f64> {
        match self {
            Value::Real(f) => Ok(*f),
            Value::Integer(n) => Ok(*n as f64),
            other => Err(RunnelError::Mapping(format!(
                "expected real value, got {:?}",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> Result<&str> {
        match self {
            Value::Text(s) => Ok(s),
            other => Err(RunnelError::Mapping(format!(
                "expected text value, got {:?}",
                other
            ))),
        }
    }

    pub fn as_blob(&self) -> Result<&[u8]> {
        match self {
            Value::Blob(b) => Ok(b),
            other => Err(RunnelError::Mapping(format!(
                "expected blob value, got {:?}",
                other
            ))),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value as i64)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Integer(value as i64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Blob(value)
    }
}

impl<V: Into<Value>> From<Option<V>> for Value {
    fn from(value: Option<V>) -> Self {
        match value {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

/// One row in its storage-native shape: column name → value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    columns: BTreeMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column value, replacing any previous value.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.columns.insert(column.into(), value.into());
        self
    }

    /// Builder-style variant of [`set`](Self::set).
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(column, value);
        self
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns.get(column)
    }

    /// Get a required column value, failing if the column is absent.
    pub fn require(&self, column: &str) -> Result<&Value> {
        self.columns.get(column).ok_or_else(|| {
            RunnelError::Mapping(format!("column `{}` missing from record", column))
        })
    }

    pub fn get_i64(&self, column: &str) -> Result<i64> {
        self.require(column)?.as_i64()
    }

    pub fn get_f64(&self, column: &str) -> Result<f64> {
        self.require(column)?.as_f64()
    }

    pub fn get_str(&self, column: &str) -> Result<&str> {
        self.require(column)?.as_str()
    }

    pub fn get_blob(&self, column: &str) -> Result<&[u8]> {
        self.require(column)?.as_blob()
    }

    /// Get an optional column value; `Null` and absent both map to `None`.
    pub fn get_opt_i64(&self, column: &str) -> Result<Option<i64>> {
        match self.columns.get(column) {
            None | Some(Value::Null) => Ok(None),
            Some(v) => v.as_i64().map(Some),
        }
    }

    /// Get an optional text value; `Null` and absent both map to `None`.
    pub fn get_opt_str(&self, column: &str) -> Result<Option<&str>> {
        match self.columns.get(column) {
            None | Some(Value::Null) => Ok(None),
            Some(v) => v.as_str().map(Some),
        }
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
