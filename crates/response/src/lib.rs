//! Response assembly (spec §4.6, C6).
//!
//! Grounded on the teacher's `ports::error::PortsError` convenience-
//! constructor style and the general shape of a JSON-envelope assembler: no
//! server/transport code here (the HTTP surface that would serve this JSON
//! is out of scope), just the pure function from an accumulated error set
//! and a resource's rendered contribution to the wire-format envelope of
//! spec §6.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::collections::HashMap;

use kestrel_core::{ActionId, RequestId};
use kestrel_error::{ApiError, ErrorRegistry, ResolverError};
use kestrel_workflow::ApiResponseBlock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The `response.data` slot of the assembled envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseData {
    /// Extracted/fallback data payload.
    pub data: Value,
}

/// The `meta` slot of the assembled envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMeta {
    /// Echo of the request's graph-id.
    pub request_id: String,
}

/// The exact response envelope of spec §6.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponsePayload {
    /// `true` iff the contributing block reported success and no errors
    /// were accumulated (spec §4.6 step 2).
    pub success: bool,
    /// The extracted or fallback data payload.
    pub response: ResponseData,
    /// Request metadata.
    pub meta: ResponseMeta,
    /// Accumulated errors; omitted entirely when empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ApiError>>,
}

/// Ambient request context a fallback payload is built from when a
/// resource's `apiResponse.response.data` is empty (spec §4.6 step 3).
#[derive(Debug, Clone, Default)]
pub struct AssemblyContext {
    /// Graph-id of the current request.
    pub request_id: RequestId,
    /// Query parameters the request carried, if any (ambient, transport
    /// supplied; this core never parses them itself).
    pub query_params: HashMap<String, String>,
    /// A status code to echo in the fallback payload.
    pub status: i32,
}

/// Recursively extract a single response-data item (spec §4.6
/// `extractResponseData`): a map recurses into its values; a string is
/// JSON-decoded if it parses, otherwise passed through; anything else
/// passes through unchanged.
#[must_use]
pub fn extract_one(item: &Value) -> Value {
    match item {
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (key, value) in map {
                out.insert(key.clone(), extract_one(value));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(extract_one).collect()),
        Value::String(text) => serde_json::from_str::<Value>(text).unwrap_or_else(|_| Value::String(text.clone())),
        other => other.clone(),
    }
}

/// Apply [`extract_one`] across a list (spec §4.6 `extractResponseData`).
#[must_use]
pub fn extract_response_data(items: &[Value]) -> Vec<Value> {
    items.iter().map(extract_one).collect()
}

fn fallback_payload(ctx: &AssemblyContext) -> Value {
    serde_json::json!({
        "queryParams": ctx.query_params,
        "status": ctx.status,
        "requestID": ctx.request_id.as_uuid().to_string(),
    })
}

/// Assemble the response envelope (spec §4.6 `BuildResponse`).
///
/// `block` is the resource's rendered `apiResponse` contribution, if any
/// resource produced one; `errors` is the full accumulated list for this
/// request (spec §4.6 step 1, via [`ErrorRegistry::get_errors`]).
#[must_use]
pub fn build_response(
    block: Option<&ApiResponseBlock>,
    errors: Vec<ApiError>,
    ctx: &AssemblyContext,
) -> ResponsePayload {
    let block_success = block.map_or(true, |b| b.success);
    let success = block_success && errors.is_empty();

    let extracted = block.map(|b| extract_response_data(&b.response.data)).unwrap_or_default();
    let data = if extracted.is_empty() {
        fallback_payload(ctx)
    } else {
        Value::Array(extracted)
    };

    ResponsePayload {
        success,
        response: ResponseData { data },
        meta: ResponseMeta {
            request_id: ctx.request_id.as_uuid().to_string(),
        },
        errors: (!errors.is_empty()).then_some(errors),
    }
}

/// Outcome of [`handle_api_error_response`] (spec §7
/// `HandleAPIErrorResponse`).
#[derive(Debug)]
pub enum ApiErrorOutcome {
    /// Non-fatal: the error was recorded, processing continues.
    Continue,
    /// Fatal in API-server mode: the comprehensive merged response to
    /// return immediately.
    FatalResponse(Box<ResponsePayload>),
    /// Fatal outside API-server mode: a plain control-flow error.
    FatalError(ResolverError),
}

/// `HandleAPIErrorResponse(code, message, fatal)` (spec §7).
///
/// Always appends to the error registry. When `fatal` and `api_server_mode`,
/// assembles the comprehensive merged error response and signals immediate
/// return. When `fatal` and not `api_server_mode`, signals a plain error.
/// Otherwise, signals that processing should continue.
pub fn handle_api_error_response(
    registry: &ErrorRegistry,
    action_id: Option<&ActionId>,
    code: i32,
    message: impl Into<String>,
    fatal: bool,
    api_server_mode: bool,
    ctx: &AssemblyContext,
) -> ApiErrorOutcome {
    let message = message.into();
    registry.add_error(ctx.request_id, action_id, code, message.clone());

    if !fatal {
        return ApiErrorOutcome::Continue;
    }

    if api_server_mode {
        let errors = registry.get_errors(ctx.request_id);
        let payload = build_response(None, errors, ctx);
        ApiErrorOutcome::FatalResponse(Box::new(payload))
    } else {
        ApiErrorOutcome::FatalError(ResolverError::Assembly(message))
    }
}
