//! Per-run request context (spec §6 `NewResolver(..., req, ...)`).

use std::collections::HashMap;

use kestrel_core::RequestId;

/// Ambient per-request values the engine threads through handler contexts
/// and the response assembler.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Graph-id namespacing this request's store entries.
    pub request_id: RequestId,
    /// Query parameters the inbound request carried, echoed in the fallback
    /// response payload when a resource contributes no data (spec §4.6
    /// step 3).
    pub query_params: HashMap<String, String>,
}

impl RequestContext {
    /// Construct a context with no query parameters.
    #[must_use]
    pub fn new(request_id: RequestId) -> Self {
        Self {
            request_id,
            query_params: HashMap::new(),
        }
    }

    /// Construct a context carrying query parameters.
    #[must_use]
    pub fn with_query_params(request_id: RequestId, query_params: HashMap<String, String>) -> Self {
        Self { request_id, query_params }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_has_no_query_params() {
        let ctx = RequestContext::new(RequestId::new_v4());
        assert!(ctx.query_params.is_empty());
    }

    #[test]
    fn with_query_params_carries_them_through() {
        let mut params = HashMap::new();
        params.insert("q".to_owned(), "1".to_owned());
        let ctx = RequestContext::with_query_params(RequestId::new_v4(), params.clone());
        assert_eq!(ctx.query_params, params);
    }
}
