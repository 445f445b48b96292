//! Request builder, response parser and executor for Consul's KV and catalog
//! endpoints.
//!
//! # Design
//! `ConsulClient` holds only the resolved `Endpoint`. Every operation comes
//! in three parts: a `build_*` method producing an `HttpRequest`, a
//! `parse_*` method consuming an `HttpResponse`, and a method that joins the
//! two over a caller-supplied `Transport`. The build and parse halves never
//! touch the network.

use serde_json::Value;

use crate::endpoint::Endpoint;
use crate::error::ConsulError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, OCTET_STREAM};
use crate::transport::Transport;
use crate::types::{KeyData, KeyFormat, KvValue, ServiceNode};
use crate::validate::{check_acknowledgement, check_status, Operation};

/// Client for one Consul agent, identified by its base URL.
#[derive(Debug, Clone)]
pub struct ConsulClient {
    endpoint: Endpoint,
}

impl ConsulClient {
    /// Resolve `consul_url`. Fails with `ConsulError::Configuration` when
    /// no host can be extracted.
    pub fn new(consul_url: &str) -> Result<Self, ConsulError> {
        Ok(Self {
            endpoint: Endpoint::parse(consul_url)?,
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    // -- get_key --------------------------------------------------------

    pub fn build_get_key(&self, key: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("/v1/kv/{key}?raw=true"),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn parse_get_key(
        &self,
        key: &str,
        format: KeyFormat,
        response: HttpResponse,
    ) -> Result<KeyData, ConsulError> {
        check_status(&response, self.endpoint.host(), &Operation::GetKey(key.to_string()))?;
        decode_key_value(response.body, format)
    }

    /// Fetch `key` and decode it according to `format`.
    pub fn get_key<T: Transport>(
        &self,
        transport: &T,
        key: &str,
        format: KeyFormat,
    ) -> Result<KeyData, ConsulError> {
        let response = transport.execute(&self.endpoint, &self.build_get_key(key))?;
        self.parse_get_key(key, format, response)
    }

    // -- set_key / delete_key --------------------------------------------

    /// Build the write for `value`. `Absent` becomes a DELETE; empty text is
    /// rejected with `InvalidValue`, as in `KvValue::from_json`.
    pub fn build_set_key(&self, key: &str, value: &KvValue) -> Result<HttpRequest, ConsulError> {
        let body = match value {
            KvValue::Absent => return Ok(self.build_delete_key(key)),
            KvValue::Text(text) if text.is_empty() => {
                return Err(ConsulError::InvalidValue("empty string".to_string()))
            }
            KvValue::Text(text) => text.clone(),
            KvValue::Structured(json) => {
                serde_json::to_string(json).map_err(ConsulError::Serialization)?
            }
        };
        Ok(HttpRequest {
            method: HttpMethod::Put,
            path: format!("/v1/kv/{key}"),
            headers: vec![("Content-Type".to_string(), OCTET_STREAM.to_string())],
            body: Some(body),
        })
    }

    pub fn build_delete_key(&self, key: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Delete,
            path: format!("/v1/kv/{key}"),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Validate the response to a write built from `value`. Status 200 and a
    /// body of exactly `true` are both required.
    pub fn parse_set_key(
        &self,
        key: &str,
        value: &KvValue,
        response: HttpResponse,
    ) -> Result<(), ConsulError> {
        let operation = match value {
            KvValue::Absent => Operation::DeleteKey(key.to_string()),
            KvValue::Text(_) | KvValue::Structured(_) => Operation::SetKey(key.to_string()),
        };
        check_acknowledgement(&response, self.endpoint.host(), &operation)
    }

    /// Write `value` to `key`, or delete the key when `value` is `Absent`.
    pub fn set_key<T: Transport>(
        &self,
        transport: &T,
        key: &str,
        value: &KvValue,
    ) -> Result<(), ConsulError> {
        let request = self.build_set_key(key, value)?;
        let response = transport.execute(&self.endpoint, &request)?;
        self.parse_set_key(key, value, response)
    }

    pub fn delete_key<T: Transport>(&self, transport: &T, key: &str) -> Result<(), ConsulError> {
        self.set_key(transport, key, &KvValue::Absent)
    }

    // -- get_service_nodes -------------------------------------------------

    pub fn build_get_service_nodes(&self, service: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("/v1/catalog/service/{service}"),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn parse_get_service_nodes(
        &self,
        service: &str,
        response: HttpResponse,
    ) -> Result<Vec<ServiceNode>, ConsulError> {
        check_status(
            &response,
            self.endpoint.host(),
            &Operation::GetService(service.to_string()),
        )?;
        serde_json::from_slice(&response.body).map_err(ConsulError::decode)
    }

    /// List the catalog entries for every node providing `service`.
    pub fn get_service_nodes<T: Transport>(
        &self,
        transport: &T,
        service: &str,
    ) -> Result<Vec<ServiceNode>, ConsulError> {
        let response = transport.execute(&self.endpoint, &self.build_get_service_nodes(service))?;
        self.parse_get_service_nodes(service, response)
    }
}

fn decode_key_value(body: Vec<u8>, format: KeyFormat) -> Result<KeyData, ConsulError> {
    let parse = |body: &[u8]| serde_json::from_slice::<Value>(body).map_err(ConsulError::decode);
    match format {
        KeyFormat::String => String::from_utf8(body)
            .map(KeyData::Text)
            .map_err(ConsulError::decode),
        KeyFormat::Hash => parse(&body).map(KeyData::Structured),
        KeyFormat::Json => {
            let value = parse(&body)?;
            serde_json::to_string(&value)
                .map(KeyData::Text)
                .map_err(ConsulError::decode)
        }
        KeyFormat::JsonPretty => {
            let value = parse(&body)?;
            serde_json::to_string_pretty(&value)
                .map(|text| KeyData::Text(text.trim_end_matches('\n').to_string()))
                .map_err(ConsulError::decode)
        }
    }
}
