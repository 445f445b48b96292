//! Error type for the Consul data client.
//!
//! # Design
//! Every failure a caller can observe is a variant of `ConsulError`. Status
//! failures and rejected acknowledgements carry the host, the operation and
//! the key or service so the rendered message is enough to diagnose a
//! problem without looking at logs. Nothing here is retried; the caller owns
//! any retry policy.

use thiserror::Error;

use crate::validate::Operation;

/// Errors returned by `ConsulClient` operations and the top-level helpers.
#[derive(Debug, Error)]
pub enum ConsulError {
    /// The base URL could not be parsed, or it carries no host. Raised
    /// before any network I/O.
    #[error("Unable to parse a hostname from {url}")]
    Configuration { url: String },

    /// The connection to Consul could not be established or broke mid-call.
    #[error("Unable to reach Consul at {host}: {source}")]
    Transport {
        host: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Consul answered with something other than 200.
    #[error(
        "Received {status} response code from Consul at {host} {operation}{}",
        api_errors_suffix(.api_errors)
    )]
    ApiStatus {
        status: u16,
        host: String,
        operation: Operation,
        body: String,
        api_errors: Option<String>,
    },

    /// A KV mutation returned 200 but the body was not the literal `true`.
    #[error(
        "Received a response of '{body}' instead of 'true' when {}{}",
        describe_action(.operation),
        api_errors_suffix(.api_errors)
    )]
    UnexpectedAcknowledgement {
        operation: Operation,
        body: String,
        api_errors: Option<String>,
    },

    /// The response body had to be JSON (or UTF-8 text) and was not.
    #[error("Error parsing json from Consul response")]
    Decode(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A structured value could not be rendered as JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The requested key return format is not one of
    /// `string`, `hash`, `json` or `json_pretty`.
    #[error("unsupported key return format '{0}'")]
    InvalidFormat(String),

    /// The value handed to `set_key` is not absent, a non-empty string, a
    /// mapping, or a sequence of mappings.
    #[error("unsupported value for a Consul key: {0}")]
    InvalidValue(String),
}

impl ConsulError {
    pub(crate) fn decode(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        ConsulError::Decode(source.into())
    }
}

fn describe_action(operation: &Operation) -> String {
    format!("{} key {}", operation.action(), operation.target())
}

fn api_errors_suffix(api_errors: &Option<String>) -> String {
    match api_errors {
        Some(errors) => format!(" (api errors: {errors})"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_status_message_without_errors() {
        let err = ConsulError::ApiStatus {
            status: 404,
            host: "consul.example".to_string(),
            operation: Operation::GetKey("foo".to_string()),
            body: String::new(),
            api_errors: None,
        };
        assert_eq!(
            err.to_string(),
            "Received 404 response code from Consul at consul.example for key foo"
        );
    }

    #[test]
    fn api_status_message_with_errors() {
        let err = ConsulError::ApiStatus {
            status: 500,
            host: "consul.example".to_string(),
            operation: Operation::DeleteKey("foo".to_string()),
            body: r#"{"errors":["boom"]}"#.to_string(),
            api_errors: Some(r#"["boom"]"#.to_string()),
        };
        assert_eq!(
            err.to_string(),
            r#"Received 500 response code from Consul at consul.example while deleting key foo (api errors: ["boom"])"#
        );
    }

    #[test]
    fn acknowledgement_message_names_action_and_key() {
        let err = ConsulError::UnexpectedAcknowledgement {
            operation: Operation::SetKey("app/config".to_string()),
            body: "false".to_string(),
            api_errors: None,
        };
        assert_eq!(
            err.to_string(),
            "Received a response of 'false' instead of 'true' when setting key app/config"
        );
    }

    #[test]
    fn configuration_message_names_url() {
        let err = ConsulError::Configuration {
            url: "consul:8500".to_string(),
        };
        assert_eq!(err.to_string(), "Unable to parse a hostname from consul:8500");
    }
}
