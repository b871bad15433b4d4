//! HTTP resource handler (spec §4.3.2).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use kestrel_core::codec;
use kestrel_ports::{FilesystemPort, HttpPort, HttpRequest};
use kestrel_workflow::{HttpBlock, HttpBlockResponse};

use crate::context::HandlerContext;
use crate::error::ActionError;
use crate::ResourceHandler;

fn decode_map_if_base64(map: &HashMap<String, String>) -> HashMap<String, String> {
    map.iter()
        .map(|(k, v)| {
            let decoded = if codec::is_base64(v) {
                codec::decode(v).unwrap_or_else(|_| v.clone())
            } else {
                v.clone()
            };
            (k.clone(), decoded)
        })
        .collect()
}

/// The HTTP resource handler.
pub struct HttpHandler {
    http: Arc<dyn HttpPort>,
    filesystem: Arc<dyn FilesystemPort>,
}

impl HttpHandler {
    /// Construct a handler over the HTTP and filesystem ports.
    #[must_use]
    pub fn new(http: Arc<dyn HttpPort>, filesystem: Arc<dyn FilesystemPort>) -> Self {
        Self { http, filesystem }
    }
}

#[async_trait::async_trait]
impl ResourceHandler<HttpBlock> for HttpHandler {
    async fn handle(&self, ctx: &HandlerContext, block: &mut HttpBlock) -> Result<(), ActionError> {
        if block.method.trim().is_empty() {
            return Err(ActionError::Protocol("http block has an empty method".into()));
        }
        if block.url.trim().is_empty() {
            return Err(ActionError::Protocol("http block has an empty url".into()));
        }
        if block.requires_body() && block.data.as_ref().map_or(true, Vec::is_empty) {
            return Err(ActionError::Protocol(format!(
                "http method {} requires a non-empty body",
                block.method
            )));
        }

        let headers = block.headers.as_ref().map(decode_map_if_base64).unwrap_or_default();
        let params = block.params.as_ref().map(decode_map_if_base64).unwrap_or_default();
        let body = block.data.as_ref().map(|lines| {
            let joined = lines.join("");
            if codec::is_base64(&joined) {
                codec::decode(&joined).unwrap_or(joined).into_bytes()
            } else {
                lines.join("\n").into_bytes()
            }
        });

        let timeout = block
            .timeout_duration
            .map(Duration::from_secs)
            .unwrap_or(HttpRequest::DEFAULT_TIMEOUT);

        let request = HttpRequest {
            method: block.method.to_uppercase(),
            url: block.url.clone(),
            headers,
            params,
            body,
            timeout,
        };

        let response = self.http.execute(request).await?;

        let body_text = String::from_utf8_lossy(&response.body).into_owned();

        let dir = ctx.artifact_dir();
        self.filesystem.mkdir_all(&dir).await?;
        let body_path = dir.join(format!("{}-response-body", ctx.storage_collection().replace([':', '@', '/'], "_")));
        self.filesystem.write(&body_path, &response.body).await?;

        block.response = Some(HttpBlockResponse {
            headers: response.headers.clone(),
            body: body_text.clone(),
        });
        block.timestamp = Some(ctx.clock.now());

        let collection = ctx.storage_collection();
        ctx.store.set(ctx.request_id, &collection, "body", &body_text)?;
        ctx.store
            .set(ctx.request_id, &collection, "path", &body_path.to_string_lossy())?;
        ctx.store
            .set(ctx.request_id, &collection, "headers", &serde_json::to_string(&response.headers)?)?;
        ctx.store
            .set(ctx.request_id, &collection, "timestamp", &block.timestamp.unwrap().as_nanos().to_string())?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_map_if_base64_decodes_encoded_values() {
        let mut map = HashMap::new();
        map.insert("x".to_owned(), codec::encode_idempotent("secret"));
        let decoded = decode_map_if_base64(&map);
        assert_eq!(decoded["x"], "secret");
    }

    #[test]
    fn decode_map_if_base64_leaves_plain_values() {
        let mut map = HashMap::new();
        map.insert("x".to_owned(), "plain value".to_owned());
        let decoded = decode_map_if_base64(&map);
        assert_eq!(decoded["x"], "plain value");
    }
}
