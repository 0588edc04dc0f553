//! A flat key-value view of the workload configuration.
//!
//! The workload section of a benchmark file is a flat TOML table, e.g.:
//!
//! ```toml
//! [workload]
//! recordcount = 1000
//! operationcount = 1000
//! readproportion = 0.5
//! updateproportion = 0.5
//! requestdistribution = "zipfian"
//! ```
//!
//! [`Properties`] reads it the way the workload needs: by key, with or without a default. Values
//! are typed when they come from TOML, but overrides from the environment or the command line
//! arrive as strings, so every getter also accepts a string that parses to the requested type.

use crate::error::{Error, Result};
use toml::{Table, Value};

/// A flat, typed-on-read configuration map.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Properties(Table);

impl Properties {
    pub fn new() -> Self {
        Self(Table::new())
    }

    pub fn from_table(table: Table) -> Self {
        Self(table)
    }

    /// Parse a TOML document whose top level is the flat key-value map.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        use figment::providers::{Format, Toml};
        let table: Table = figment::Figment::new()
            .merge(Toml::string(text))
            .extract()?;
        Ok(Self(table))
    }

    /// Insert or override a property.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn table(&self) -> &Table {
        &self.0
    }

    fn require(&self, key: &str) -> Result<&Value> {
        self.0
            .get(key)
            .ok_or_else(|| Error::MissingKey(key.to_string()))
    }

    pub fn get_string(&self, key: &str) -> Result<String> {
        match self.require(key)? {
            Value::String(s) => Ok(s.clone()),
            v @ (Value::Integer(_) | Value::Float(_) | Value::Boolean(_)) => Ok(v.to_string()),
            v => Err(invalid(key, v, "a string")),
        }
    }

    pub fn get_string_or(&self, key: &str, default: &str) -> Result<String> {
        match self.contains(key) {
            true => self.get_string(key),
            false => Ok(default.to_string()),
        }
    }

    pub fn get_int(&self, key: &str) -> Result<i64> {
        match self.require(key)? {
            Value::Integer(i) => Ok(*i),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| invalid_str(key, s, "an integer")),
            v => Err(invalid(key, v, "an integer")),
        }
    }

    pub fn get_int_or(&self, key: &str, default: i64) -> Result<i64> {
        match self.contains(key) {
            true => self.get_int(key),
            false => Ok(default),
        }
    }

    pub fn get_uint(&self, key: &str) -> Result<u64> {
        let i = self.get_int(key)?;
        u64::try_from(i).map_err(|_| Error::InvalidValue {
            key: key.to_string(),
            value: i.to_string(),
            expected: "a non-negative integer",
        })
    }

    pub fn get_uint_or(&self, key: &str, default: u64) -> Result<u64> {
        match self.contains(key) {
            true => self.get_uint(key),
            false => Ok(default),
        }
    }

    pub fn get_double(&self, key: &str) -> Result<f64> {
        match self.require(key)? {
            Value::Float(f) => Ok(*f),
            Value::Integer(i) => Ok(*i as f64),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| invalid_str(key, s, "a number")),
            v => Err(invalid(key, v, "a number")),
        }
    }

    pub fn get_double_or(&self, key: &str, default: f64) -> Result<f64> {
        match self.contains(key) {
            true => self.get_double(key),
            false => Ok(default),
        }
    }

    pub fn get_bool(&self, key: &str) -> Result<bool> {
        match self.require(key)? {
            Value::Boolean(b) => Ok(*b),
            Value::String(s) => s
                .trim()
                .parse::<bool>()
                .map_err(|_| invalid_str(key, s, "a boolean")),
            v => Err(invalid(key, v, "a boolean")),
        }
    }

    pub fn get_bool_or(&self, key: &str, default: bool) -> Result<bool> {
        match self.contains(key) {
            true => self.get_bool(key),
            false => Ok(default),
        }
    }
}

fn invalid(key: &str, value: &Value, expected: &'static str) -> Error {
    Error::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        expected,
    }
}

fn invalid_str(key: &str, value: &str, expected: &'static str) -> Error {
    Error::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        expected,
    }
}
