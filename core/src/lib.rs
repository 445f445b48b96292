//! Client for Consul's HTTP key/value and catalog APIs.
//!
//! # Overview
//! Three lookups are exposed, each taking the base URL of a Consul agent:
//! [`get_key`], [`set_key`] and [`get_service_nodes`]. Each call resolves the
//! URL, performs exactly one request over a fresh [`UreqTransport`] and
//! returns the decoded result or a [`ConsulError`].
//!
//! # Design
//! - `ConsulClient` holds only the resolved `Endpoint` and no mutable state.
//! - Each operation is split into `build_*` (produces a request) and
//!   `parse_*` (consumes a response), so every protocol rule is testable
//!   without I/O. The `Transport` trait is the only seam that touches the
//!   network.
//! - Callers that want to reuse a transport handle across calls build a
//!   `ConsulClient` and pass their own `Transport`.

pub mod client;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;
pub mod validate;

pub use client::ConsulClient;
pub use endpoint::{Endpoint, Scheme};
pub use error::ConsulError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::{Transport, UreqTransport};
pub use types::{KeyData, KeyFormat, KvValue, ServiceNode};
pub use validate::Operation;

/// Read `key` from the Consul agent at `consul_url`.
pub fn get_key(consul_url: &str, key: &str, format: KeyFormat) -> Result<KeyData, ConsulError> {
    let client = ConsulClient::new(consul_url)?;
    let transport = UreqTransport::open();
    let result = client.get_key(&transport, key, format);
    transport.close();
    result
}

/// Write `value` to `key`, or delete `key` when `value` is `KvValue::Absent`.
pub fn set_key(consul_url: &str, key: &str, value: &KvValue) -> Result<(), ConsulError> {
    let client = ConsulClient::new(consul_url)?;
    let transport = UreqTransport::open();
    let result = client.set_key(&transport, key, value);
    transport.close();
    result
}

/// List the nodes registered under `service`.
pub fn get_service_nodes(consul_url: &str, service: &str) -> Result<Vec<ServiceNode>, ConsulError> {
    let client = ConsulClient::new(consul_url)?;
    let transport = UreqTransport::open();
    let result = client.get_service_nodes(&transport, service);
    transport.close();
    result
}
