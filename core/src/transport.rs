//! The network seam between `ConsulClient` and Consul.
//!
//! # Design
//! `Transport` executes one `HttpRequest` against an `Endpoint` and returns
//! the response as data, whatever its status. `UreqTransport` is an explicit
//! handle owned by the caller: it is opened, used for as many calls as the
//! caller likes, and closed (or dropped). It keeps no idle connections, so
//! every request opens and tears down its own connection. Redirects are not
//! followed; a 3xx is handed back like any other status. Bodies are read as
//! raw bytes. There is no retry and no timeout beyond ureq's defaults.

use ureq::{Agent, RequestBuilder};

use crate::endpoint::Endpoint;
use crate::error::ConsulError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes a single HTTP round-trip.
pub trait Transport {
    /// Send `request` to `endpoint`. Non-2xx statuses are returned as
    /// `Ok`; only connection and I/O failures are errors.
    fn execute(&self, endpoint: &Endpoint, request: &HttpRequest)
        -> Result<HttpResponse, ConsulError>;
}

/// Blocking transport backed by a `ureq::Agent`. TLS is used for `https`
/// endpoints.
#[derive(Debug)]
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    pub fn open() -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .max_redirects(0)
            .max_redirects_will_error(false)
            .max_idle_connections(0)
            .build()
            .new_agent();
        Self { agent }
    }

    /// Release the handle. Equivalent to dropping it.
    pub fn close(self) {}
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::open()
    }
}

impl Transport for UreqTransport {
    fn execute(
        &self,
        endpoint: &Endpoint,
        request: &HttpRequest,
    ) -> Result<HttpResponse, ConsulError> {
        let url = endpoint.url_for(&request.path);
        let transport_error = |source: ureq::Error| ConsulError::Transport {
            host: endpoint.host().to_string(),
            source: Box::new(source),
        };

        tracing::debug!(
            method = %request.method,
            host = endpoint.host(),
            path = %request.path,
            "sending consul request"
        );

        let result = match (request.method, request.body.as_deref()) {
            (HttpMethod::Get, _) => with_headers(self.agent.get(&url), &request.headers).call(),
            (HttpMethod::Delete, _) => {
                with_headers(self.agent.delete(&url), &request.headers).call()
            }
            (HttpMethod::Put, Some(body)) => {
                with_headers(self.agent.put(&url), &request.headers).send(body.as_bytes())
            }
            (HttpMethod::Put, None) => {
                with_headers(self.agent.put(&url), &request.headers).send_empty()
            }
        };
        let mut response = result.map_err(transport_error)?;

        let status = response.status().as_u16();
        let body = response.body_mut().read_to_vec().map_err(transport_error)?;

        tracing::debug!(status, host = endpoint.host(), path = %request.path, "consul responded");

        Ok(HttpResponse { status, body })
    }
}

fn with_headers<B>(mut builder: RequestBuilder<B>, headers: &[(String, String)]) -> RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}
