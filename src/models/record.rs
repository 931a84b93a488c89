// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Heterogeneous row records exchanged with the remote store.
//!
//! Field access goes through [`RecordExt`], which distinguishes a missing
//! field from a field of the wrong type. Optional fields use the `opt_*`
//! accessors, where both "absent" and "null" mean "skip".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// A single field value in a remote record.
///
/// Variant order matters for untagged deserialization: JSON integers become
/// `Integer`, other numbers `Double`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Double(f64),
    String(String),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric value; integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Uuid> for Value {
    fn from(id: Uuid) -> Self {
        Value::String(id.to_string())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(date: DateTime<Utc>) -> Self {
        Value::String(crate::time_utils::format_utc_rfc3339(date))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// A row keyed by snake_case column name.
pub type Record = BTreeMap<String, Value>;

/// Errors from reading typed fields out of a record.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Invalid field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl RecordError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        RecordError::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

/// Typed accessors over a [`Record`].
pub trait RecordExt {
    fn field(&self, name: &'static str) -> Result<&Value, RecordError>;
    fn opt_field(&self, name: &'static str) -> Option<&Value>;

    fn str_field(&self, name: &'static str) -> Result<&str, RecordError> {
        self.field(name)?
            .as_str()
            .ok_or_else(|| RecordError::invalid(name, "expected string"))
    }

    fn f64_field(&self, name: &'static str) -> Result<f64, RecordError> {
        self.field(name)?
            .as_f64()
            .ok_or_else(|| RecordError::invalid(name, "expected number"))
    }

    fn uuid_field(&self, name: &'static str) -> Result<Uuid, RecordError> {
        let raw = self.str_field(name)?;
        Uuid::parse_str(raw).map_err(|e| RecordError::invalid(name, e.to_string()))
    }

    fn time_field(&self, name: &'static str) -> Result<DateTime<Utc>, RecordError> {
        let raw = self.str_field(name)?;
        crate::time_utils::parse_rfc3339(raw).map_err(|e| RecordError::invalid(name, e))
    }

    /// Optional string; `None` when absent or null.
    fn opt_str(&self, name: &'static str) -> Result<Option<&str>, RecordError> {
        match self.opt_field(name) {
            None => Ok(None),
            Some(v) => v
                .as_str()
                .map(Some)
                .ok_or_else(|| RecordError::invalid(name, "expected string or null")),
        }
    }

    fn opt_f64(&self, name: &'static str) -> Result<Option<f64>, RecordError> {
        match self.opt_field(name) {
            None => Ok(None),
            Some(v) => v
                .as_f64()
                .map(Some)
                .ok_or_else(|| RecordError::invalid(name, "expected number or null")),
        }
    }

    fn opt_uuid(&self, name: &'static str) -> Result<Option<Uuid>, RecordError> {
        match self.opt_str(name)? {
            None => Ok(None),
            Some(raw) => Uuid::parse_str(raw)
                .map(Some)
                .map_err(|e| RecordError::invalid(name, e.to_string())),
        }
    }
}

impl RecordExt for Record {
    fn field(&self, name: &'static str) -> Result<&Value, RecordError> {
        match self.get(name) {
            None | Some(Value::Null) => Err(RecordError::MissingField(name)),
            Some(v) => Ok(v),
        }
    }

    fn opt_field(&self, name: &'static str) -> Option<&Value> {
        self.get(name).filter(|v| !v.is_null())
    }
}
