//! Values passed into and returned from the KV and catalog operations.
//!
//! # Design
//! The hosting layer hands over loosely typed input. `KeyFormat` and
//! `KvValue` resolve that input once, up front, so the client itself only
//! deals with closed sets of cases.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ConsulError;

/// One node registered under a service, as returned by the catalog. The
/// shape is Consul's and is passed through untouched.
pub type ServiceNode = Map<String, Value>;

/// How `get_key` should hand back the stored value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyFormat {
    /// The raw body, unmodified.
    #[default]
    String,
    /// The body decoded as JSON.
    Hash,
    /// The body decoded as JSON and re-rendered on a single line.
    Json,
    /// The body decoded as JSON and re-rendered with two-space indentation.
    JsonPretty,
}

impl KeyFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            KeyFormat::String => "string",
            KeyFormat::Hash => "hash",
            KeyFormat::Json => "json",
            KeyFormat::JsonPretty => "json_pretty",
        }
    }
}

impl fmt::Display for KeyFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyFormat {
    type Err = ConsulError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(KeyFormat::String),
            "hash" => Ok(KeyFormat::Hash),
            "json" => Ok(KeyFormat::Json),
            "json_pretty" => Ok(KeyFormat::JsonPretty),
            other => Err(ConsulError::InvalidFormat(other.to_string())),
        }
    }
}

/// The value of a key as returned by `get_key`.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyData {
    Text(String),
    Structured(Value),
}

impl KeyData {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            KeyData::Text(text) => Some(text.as_str()),
            KeyData::Structured(_) => None,
        }
    }

    pub fn as_structured(&self) -> Option<&Value> {
        match self {
            KeyData::Structured(value) => Some(value),
            KeyData::Text(_) => None,
        }
    }
}

/// What `set_key` should write. `Absent` deletes the key.
#[derive(Debug, Clone, PartialEq)]
pub enum KvValue {
    Absent,
    Text(String),
    Structured(Value),
}

impl KvValue {
    /// Resolve a loosely typed value: `null` deletes, a non-empty string is
    /// stored verbatim, and a mapping or a sequence of mappings is stored as
    /// JSON. Everything else is rejected.
    pub fn from_json(value: Value) -> Result<Self, ConsulError> {
        match value {
            Value::Null => Ok(KvValue::Absent),
            Value::String(text) if text.is_empty() => {
                Err(ConsulError::InvalidValue("empty string".to_string()))
            }
            Value::String(text) => Ok(KvValue::Text(text)),
            Value::Object(map) => Ok(KvValue::Structured(Value::Object(map))),
            Value::Array(items) if items.iter().all(Value::is_object) => {
                Ok(KvValue::Structured(Value::Array(items)))
            }
            Value::Array(_) => Err(ConsulError::InvalidValue(
                "arrays may only contain mappings".to_string(),
            )),
            other => Err(ConsulError::InvalidValue(other.to_string())),
        }
    }
}
