//! HTTP request/response values exchanged with a `Transport`.
//!
//! # Design
//! Requests and responses are plain data. `ConsulClient::build_*` produces an
//! `HttpRequest` whose `path` is relative to the `Endpoint`; the transport
//! performs the round-trip and hands back an `HttpResponse` for
//! `ConsulClient::parse_*`. Keeping these as owned values lets protocol rules
//! be tested without a socket.

use std::fmt;

/// Content type sent with every KV write, regardless of the payload shape.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// HTTP method for a request. Consul's KV and catalog reads and writes need
/// no others.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    /// Path and query, starting with `/`.
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// An HTTP response described as plain data. The body is kept as raw bytes;
/// text decoding happens only after the status has been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Body as text, with invalid UTF-8 replaced. Used for error messages.
    pub fn body_lossy(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
