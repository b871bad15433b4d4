//! `HTTPBlock` — the typed body of an HTTP run step (spec §3, §4.3.2).

use std::collections::HashMap;

use kestrel_core::Timestamp;
use serde::{Deserialize, Serialize};

/// HTTP methods that require a request body per spec §4.3.2 / §9 open question (c).
pub const METHODS_REQUIRING_BODY: &[&str] = &["POST", "PUT", "PATCH", "DELETE"];

/// The response recorded onto an `HTTPBlock` after execution.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HttpBlockResponse {
    /// First value captured per response header name.
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Response body (base64-decoded if the transport encoded it).
    #[serde(default)]
    pub body: String,
}

/// The typed body of an HTTP run step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpBlock {
    /// HTTP method; validated case-insensitively against [`METHODS_REQUIRING_BODY`].
    pub method: String,
    /// Target URL.
    pub url: String,
    /// Request headers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
    /// Query parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<HashMap<String, String>>,
    /// Request body lines; required for methods in [`METHODS_REQUIRING_BODY`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<String>>,
    /// Response recorded by the handler on completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<HttpBlockResponse>,
    /// Per-step timeout, in seconds; defaults to 30s (spec §4.3.2) when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_duration: Option<u64>,
    /// Watermark written by the handler on completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
}

impl HttpBlock {
    /// Construct a minimal HTTP block with only method and URL set.
    #[must_use]
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: None,
            params: None,
            data: None,
            response: None,
            timeout_duration: None,
            timestamp: None,
        }
    }

    /// Returns `true` if this method requires a non-empty `data` (spec §4.3.2,
    /// §9 open question (c): POST, PUT, PATCH and DELETE all require a body).
    #[must_use]
    pub fn requires_body(&self) -> bool {
        METHODS_REQUIRING_BODY
            .iter()
            .any(|m| m.eq_ignore_ascii_case(&self.method))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_does_not_require_body() {
        assert!(!HttpBlock::new("GET", "https://example.com").requires_body());
        assert!(!HttpBlock::new("get", "https://example.com").requires_body());
    }

    #[test]
    fn post_put_patch_delete_require_body() {
        for method in ["POST", "put", "Patch", "DELETE"] {
            assert!(
                HttpBlock::new(method, "https://example.com").requires_body(),
                "{method} should require a body"
            );
        }
    }

    #[test]
    fn serde_roundtrip() {
        let mut block = HttpBlock::new("POST", "https://example.com");
        block.data = Some(vec!["{}".into()]);
        let json = serde_json::to_string(&block).unwrap();
        let back: HttpBlock = serde_json::from_str(&json).unwrap();
        assert_eq!(block, back);
    }
}
