//! HTTP client port (spec §6 "HTTP client port", §4.3.2).

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

use crate::error::PortsError;

/// An outbound HTTP request, already decoded and validated by the caller.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method, upper-cased (e.g. `"GET"`, `"POST"`).
    pub method: String,
    /// Target URL.
    pub url: String,
    /// Request headers.
    pub headers: HashMap<String, String>,
    /// Query parameters.
    pub params: HashMap<String, String>,
    /// Request body bytes, when the method carries one.
    pub body: Option<Vec<u8>>,
    /// Per-request timeout; defaults to 30s per spec §4.3.2 when unset.
    pub timeout: Duration,
}

impl HttpRequest {
    /// Default timeout applied when a block does not declare one.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Construct a request with no headers, params, or body, and the
    /// default timeout.
    #[must_use]
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: HashMap::new(),
            params: HashMap::new(),
            body: None,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }
}

/// An HTTP response: status, first value per header name, and the full body.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// First value captured per header name (spec §4.3.2).
    pub headers: HashMap<String, String>,
    /// Full response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Returns `true` for 2xx status codes.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Port for executing outbound HTTP requests.
#[async_trait]
pub trait HttpPort: Send + Sync {
    /// Execute a request and return its response.
    ///
    /// Transport failures (connection refused, DNS failure, timeout) are
    /// returned as [`PortsError`]; a non-2xx status is a *successful* call
    /// from the port's point of view (spec §7 treats it as a runtime-domain
    /// error recorded in the block, not a transport failure).
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, PortsError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_request_has_default_timeout() {
        let req = HttpRequest::new("GET", "https://example.com");
        assert_eq!(req.timeout, HttpRequest::DEFAULT_TIMEOUT);
        assert!(req.body.is_none());
    }

    #[test]
    fn response_is_success_classifies_status() {
        let ok = HttpResponse {
            status: 204,
            headers: HashMap::new(),
            body: Vec::new(),
        };
        let not_found = HttpResponse {
            status: 404,
            headers: HashMap::new(),
            body: Vec::new(),
        };
        assert!(ok.is_success());
        assert!(!not_found.is_success());
    }

    #[test]
    fn port_is_object_safe() {
        fn _assert(_: &dyn HttpPort) {}
    }
}
