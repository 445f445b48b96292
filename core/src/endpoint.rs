//! Resolution of the caller-supplied Consul base URL.
//!
//! # Design
//! `Endpoint::parse` is pure: it never touches the network and always fails
//! with `ConsulError::Configuration` when no host can be extracted. Any path,
//! query or fragment on the base URL is ignored. No default port is filled
//! in; a URL without an explicit port is handed to the transport as-is.

use std::fmt;

use url::Url;

use crate::error::ConsulError;

/// Wire scheme for an `Endpoint`. Only `https` enables TLS; every other
/// scheme in the base URL is treated as plaintext HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated scheme/host/port triple. Built once per call and never
/// mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    scheme: Scheme,
    host: String,
    port: Option<u16>,
}

impl Endpoint {
    /// Parse `consul_url` (`scheme://host[:port][/ignored]`).
    pub fn parse(consul_url: &str) -> Result<Self, ConsulError> {
        let configuration_error = || ConsulError::Configuration {
            url: consul_url.to_string(),
        };

        let url = Url::parse(consul_url.trim()).map_err(|_| configuration_error())?;
        let host = match url.host_str() {
            Some(host) if !host.is_empty() => host.to_string(),
            _ => return Err(configuration_error()),
        };
        let scheme = if url.scheme() == "https" {
            Scheme::Https
        } else {
            Scheme::Http
        };

        Ok(Self {
            scheme,
            host,
            port: url.port(),
        })
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn use_tls(&self) -> bool {
        self.scheme == Scheme::Https
    }

    /// `scheme://host[:port]` with no trailing slash, ready for a request
    /// path to be appended.
    pub fn base_url(&self) -> String {
        match self.port {
            Some(port) => format!("{}://{}:{port}", self.scheme, self.host),
            None => format!("{}://{}", self.scheme, self.host),
        }
    }

    /// Full URL for a request path that starts with `/`.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{path}", self.base_url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_https_url_with_port() {
        let endpoint = Endpoint::parse("https://consul-app-dev-1.doesnotexist:8500").unwrap();
        assert_eq!(endpoint.scheme(), Scheme::Https);
        assert_eq!(endpoint.host(), "consul-app-dev-1.doesnotexist");
        assert_eq!(endpoint.port(), Some(8500));
        assert!(endpoint.use_tls());
    }

    #[test]
    fn parses_http_url_and_ignores_path() {
        let endpoint = Endpoint::parse("http://127.0.0.1:8500/ui/dc1?x=1").unwrap();
        assert_eq!(endpoint.scheme(), Scheme::Http);
        assert_eq!(endpoint.host(), "127.0.0.1");
        assert_eq!(endpoint.base_url(), "http://127.0.0.1:8500");
        assert!(!endpoint.use_tls());
    }

    #[test]
    fn unknown_scheme_with_host_is_plaintext() {
        let endpoint = Endpoint::parse("consul://consul.service:8500").unwrap();
        assert_eq!(endpoint.scheme(), Scheme::Http);
        assert_eq!(endpoint.base_url(), "http://consul.service:8500");
    }

    #[test]
    fn missing_port_is_left_unset() {
        let endpoint = Endpoint::parse("http://consul.service").unwrap();
        assert_eq!(endpoint.port(), None);
        assert_eq!(endpoint.url_for("/v1/kv/foo"), "http://consul.service/v1/kv/foo");
    }

    #[test]
    fn ipv6_host_keeps_brackets() {
        let endpoint = Endpoint::parse("http://[::1]:8500").unwrap();
        assert_eq!(endpoint.base_url(), "http://[::1]:8500");
    }

    #[test]
    fn host_less_inputs_are_configuration_errors() {
        for input in ["consul:8500", "localhost:8500", "http://", "not a url", "", "file:///tmp/consul"] {
            let err = Endpoint::parse(input).unwrap_err();
            assert!(
                matches!(err, ConsulError::Configuration { ref url } if url == input),
                "{input:?} should be rejected, got {err:?}"
            );
        }
    }
}
