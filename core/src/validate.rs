//! Classification of Consul responses.
//!
//! # Design
//! Only HTTP 200 counts as success; a 404 for a missing key is a failure
//! like any other status. On failure the body is searched for a JSON `errors`
//! field whose value is appended to the message. A body that is not JSON
//! simply yields no detail. KV mutations additionally require the body to be
//! the literal `true`.

use std::fmt;

use serde_json::Value;

use crate::error::ConsulError;
use crate::http::HttpResponse;

/// The Consul operation a response belongs to, together with the key or
/// service it targeted. Used to build error messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    GetKey(String),
    SetKey(String),
    DeleteKey(String),
    GetService(String),
}

impl Operation {
    /// Key or service name this operation targeted.
    pub fn target(&self) -> &str {
        match self {
            Operation::GetKey(name)
            | Operation::SetKey(name)
            | Operation::DeleteKey(name)
            | Operation::GetService(name) => name,
        }
    }

    /// Verb used in messages about this operation.
    pub fn action(&self) -> &'static str {
        match self {
            Operation::GetKey(_) | Operation::GetService(_) => "getting",
            Operation::SetKey(_) => "setting",
            Operation::DeleteKey(_) => "deleting",
        }
    }

    fn noun(&self) -> &'static str {
        match self {
            Operation::GetService(_) => "service",
            _ => "key",
        }
    }
}

/// Renders the context clause of a status error: `for key foo`,
/// `for service consul`, `while setting key foo`, `while deleting key foo`.
impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::GetKey(_) | Operation::GetService(_) => {
                write!(f, "for {} {}", self.noun(), self.target())
            }
            Operation::SetKey(_) | Operation::DeleteKey(_) => {
                write!(f, "while {} {} {}", self.action(), self.noun(), self.target())
            }
        }
    }
}

/// Extract Consul's `errors` field from a response body, rendered as
/// compact JSON. Returns `None` when the body is not a JSON object or the
/// field is missing, `null` or `false`.
pub fn api_errors(body: &[u8]) -> Option<String> {
    let parsed: Value = serde_json::from_slice(body).ok()?;
    match parsed.get("errors")? {
        Value::Null | Value::Bool(false) => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

/// Require HTTP 200, otherwise fail with `ConsulError::ApiStatus`.
pub fn check_status(
    response: &HttpResponse,
    host: &str,
    operation: &Operation,
) -> Result<(), ConsulError> {
    if response.status == 200 {
        return Ok(());
    }
    tracing::warn!(
        status = response.status,
        host,
        operation = %operation,
        "consul returned a non-success status"
    );
    Err(ConsulError::ApiStatus {
        status: response.status,
        host: host.to_string(),
        operation: operation.clone(),
        body: response.body_lossy(),
        api_errors: api_errors(&response.body),
    })
}

/// Validate a KV mutation response: status 200 and a body of exactly `true`.
pub fn check_acknowledgement(
    response: &HttpResponse,
    host: &str,
    operation: &Operation,
) -> Result<(), ConsulError> {
    check_status(response, host, operation)?;
    if response.body == b"true" {
        return Ok(());
    }
    tracing::warn!(
        host,
        operation = %operation,
        body = %response.body_lossy(),
        "consul did not acknowledge the write"
    );
    Err(ConsulError::UnexpectedAcknowledgement {
        operation: operation.clone(),
        body: response.body_lossy(),
        api_errors: api_errors(&response.body),
    })
}
