//! Loosely-typed record values.
//!
//! A field looked up on a [`Record`] is one of three things: absent, an
//! explicit null, or a value. [`FieldRef`] keeps those apart so the formatter
//! can treat "never supplied" and "supplied as null" differently.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    I64(i64),
    F64(f64),
    Str(String),
    Date(DateTime<Utc>),
}

impl Value {
    /// Loose truthiness: `false`, zero, NaN and the empty string are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::I64(i) => *i != 0,
            Value::F64(f) => *f != 0.0 && !f.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::Date(_) => true,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::I64(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::I64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
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

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Date(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v.and_time(chrono::NaiveTime::MIN).and_utc())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl TryFrom<serde_json::Value> for Value {
    type Error = Error;

    fn try_from(v: serde_json::Value) -> Result<Self> {
        use serde_json::Value as J;
        match v {
            J::Null => Ok(Value::Null),
            J::Bool(b) => Ok(Value::Bool(b)),
            J::Number(n) => match n.as_i64() {
                Some(i) => Ok(Value::I64(i)),
                None => n
                    .as_f64()
                    .map(Value::F64)
                    .ok_or_else(|| Error::Record(format!("unrepresentable number {n}"))),
            },
            J::String(s) => Ok(Value::Str(s)),
            J::Array(_) => Err(Error::Record("nested arrays are not supported".into())),
            J::Object(_) => Err(Error::Record("nested objects are not supported".into())),
        }
    }
}

/// Result of looking a column up on a record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldRef<'a> {
    Absent,
    Null,
    Value(&'a Value),
}

/// One input record: field name -> raw value. Missing keys are absent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "serde_json::Map<String, serde_json::Value>")]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> FieldRef<'_> {
        match self.fields.get(name) {
            None => FieldRef::Absent,
            Some(Value::Null) => FieldRef::Null,
            Some(v) => FieldRef::Value(v),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl TryFrom<serde_json::Map<String, serde_json::Value>> for Record {
    type Error = Error;

    fn try_from(map: serde_json::Map<String, serde_json::Value>) -> Result<Self> {
        let mut fields = BTreeMap::new();
        for (k, v) in map {
            let value = Value::try_from(v).map_err(|e| match e {
                Error::Record(msg) => Error::Record(format!("field '{k}': {msg}")),
                other => other,
            })?;
            fields.insert(k, value);
        }
        Ok(Self { fields })
    }
}

impl TryFrom<serde_json::Value> for Record {
    type Error = Error;

    fn try_from(v: serde_json::Value) -> Result<Self> {
        match v {
            serde_json::Value::Object(map) => Record::try_from(map),
            other => Err(Error::Record(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(v: &serde_json::Value) -> &'static str {
    use serde_json::Value as J;
    match v {
        J::Null => "null",
        J::Bool(_) => "a boolean",
        J::Number(_) => "a number",
        J::String(_) => "a string",
        J::Array(_) => "an array",
        J::Object(_) => "an object",
    }
}
