use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, error, warn};

use crate::internal::mcp::{
    protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, McpRequest, JSONRPC_VERSION},
    registry::{RegistryError, ResourceRegistry},
};

/// Serialized fallback used if a response cannot be encoded.
const INTERNAL_ERROR_FRAME: &str =
    r#"{"jsonrpc":"2.0","id":null,"error":{"code":-32603,"message":"Internal error"}}"#;

/// Pure MCP message processor - no I/O, just transforms
pub struct McpProcessor {
    registry: Arc<ResourceRegistry>,
}

impl McpProcessor {
    pub fn new(registry: Arc<ResourceRegistry>) -> Self {
        Self { registry }
    }

    /// Decode one text frame and produce exactly one response for it.
    pub fn handle(&self, raw: &str) -> JsonRpcResponse {
        match Self::parse_request(raw) {
            Ok(request) => self.process_request(&request),
            Err(response) => response,
        }
    }

    /// Decode and validate the envelope.
    ///
    /// The error side is the response to send back: `ParseError` with a null
    /// id for malformed JSON, `InvalidRequest` (with the id when readable) for
    /// a bad envelope.
    pub fn parse_request(raw: &str) -> Result<JsonRpcRequest, JsonRpcResponse> {
        let value: Value = serde_json::from_str(raw).map_err(|e| {
            warn!("Received non-JSON message ({} bytes): {}", raw.len(), e);
            JsonRpcResponse::failure(None, JsonRpcError::parse_error(e))
        })?;

        let Value::Object(mut envelope) = value else {
            return Err(JsonRpcResponse::failure(
                None,
                JsonRpcError::invalid_request("Request must be a JSON object"),
            ));
        };

        let id = envelope.remove("id").filter(|id| !id.is_null());

        match envelope.remove("jsonrpc") {
            None => {}
            Some(Value::String(version)) if version == JSONRPC_VERSION => {}
            Some(_) => {
                return Err(JsonRpcResponse::failure(
                    id,
                    JsonRpcError::invalid_request("Only JSON-RPC 2.0 is supported"),
                ))
            }
        }

        let method = match envelope.remove("method") {
            Some(Value::String(method)) if !method.trim().is_empty() => method,
            _ => {
                return Err(JsonRpcResponse::failure(
                    id,
                    JsonRpcError::invalid_request("Request is missing a method"),
                ))
            }
        };

        Ok(JsonRpcRequest {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            method,
            params: envelope.remove("params"),
        })
    }

    /// Process a parsed request. Handler failures, panics included, become
    /// `InternalError` responses.
    pub fn process_request(&self, request: &JsonRpcRequest) -> JsonRpcResponse {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.route(request)));

        match outcome {
            Ok(Ok(result)) => JsonRpcResponse::success(request.id.clone(), result),
            Ok(Err(error)) => JsonRpcResponse::failure(request.id.clone(), error),
            Err(_) => {
                error!("Handler for '{}' panicked, replying with InternalError", request.method);
                JsonRpcResponse::failure(
                    request.id.clone(),
                    JsonRpcError::internal_error("Internal error"),
                )
            }
        }
    }

    fn route(&self, request: &JsonRpcRequest) -> Result<Value, JsonRpcError> {
        let call = McpRequest::from_parts(&request.method, request.params.as_ref())?;
        debug!("Processing request: {:?}", call);

        match call {
            McpRequest::Ping => Ok(json!({ "pong": true })),
            McpRequest::ResourcesList => {
                let resources = serde_json::to_value(self.registry.list()).map_err(|e| {
                    error!("Failed to encode resource list: {}", e);
                    JsonRpcError::internal_error("Internal error")
                })?;
                Ok(json!({ "resources": resources }))
            }
            McpRequest::ResourcesRead(params) => match self.registry.read(&params.name) {
                Ok(content) => Ok(json!({ "name": params.name, "content": content })),
                Err(RegistryError::NotFound(name)) => Err(JsonRpcError::resource_not_found(&name)),
                Err(e) => {
                    error!("Failed to read resource '{}': {:#}", params.name, e);
                    Err(JsonRpcError::internal_error(format!(
                        "Failed to read resource '{}'",
                        params.name
                    )))
                }
            },
        }
    }

    /// Serialize response to a text frame
    pub fn serialize_response(response: &JsonRpcResponse) -> String {
        serde_json::to_string(response).unwrap_or_else(|e| {
            error!("Failed to serialize response: {}", e);
            INTERNAL_ERROR_FRAME.to_string()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::mcp::protocol::codes;
    use crate::internal::mcp::registry::ResourceDescriptor;
    use serde_json::Map;

    fn processor() -> McpProcessor {
        let mut registry = ResourceRegistry::new();
        registry
            .register(ResourceDescriptor::new("status", "Static server status resource."), || {
                let mut content = Map::new();
                content.insert("state".into(), json!("ok"));
                Ok(content)
            })
            .unwrap();
        registry
            .register(ResourceDescriptor::new("explodes", "Panics when read."), || {
                panic!("boom")
            })
            .unwrap();
        registry
            .register(ResourceDescriptor::new("fails", "Errors when read."), || {
                Err(anyhow::anyhow!("upstream gone"))
            })
            .unwrap();
        McpProcessor::new(Arc::new(registry))
    }

    #[test]
    fn ping_echoes_id() {
        let response = processor().handle(r#"{"jsonrpc":"2.0","id":"abc","method":"ping"}"#);
        assert_eq!(response.id, Some(json!("abc")));
        assert_eq!(response.result, Some(json!({ "pong": true })));
        assert!(response.error.is_none());
    }

    #[test]
    fn missing_jsonrpc_field_is_tolerated() {
        let response = processor().handle(r#"{"id":1,"method":"ping"}"#);
        assert_eq!(response.result, Some(json!({ "pong": true })));
    }

    #[test]
    fn truncated_json_is_a_parse_error() {
        let response = processor().handle(r#"{"jsonrpc":"2.0","id":1,"meth"#);
        assert_eq!(response.id, None);
        assert_eq!(response.error.unwrap().code, codes::PARSE_ERROR);
        assert!(response.result.is_none());
    }

    #[test]
    fn envelope_problems_are_invalid_requests() {
        let p = processor();
        for raw in [
            r#"[1,2,3]"#,
            r#"{"jsonrpc":"2.0","id":4}"#,
            r#"{"jsonrpc":"2.0","id":4,"method":""}"#,
            r#"{"jsonrpc":"2.0","id":4,"method":12}"#,
            r#"{"jsonrpc":"1.0","id":4,"method":"ping"}"#,
        ] {
            let response = p.handle(raw);
            assert_eq!(response.error.unwrap().code, codes::INVALID_REQUEST, "{}", raw);
        }

        let response = p.handle(r#"{"jsonrpc":"1.0","id":4,"method":"ping"}"#);
        assert_eq!(response.id, Some(json!(4)));
    }

    #[test]
    fn read_of_unknown_resource_never_has_result() {
        let response = processor().handle(
            r#"{"jsonrpc":"2.0","id":2,"method":"resources/read","params":{"name":"missing"}}"#,
        );
        assert!(response.result.is_none());
        let error = response.error.unwrap();
        assert_eq!(error.code, codes::RESOURCE_NOT_FOUND);
        assert_eq!(error.data, Some(json!({ "name": "missing" })));
    }

    #[test]
    fn read_returns_content() {
        let response = processor().handle(
            r#"{"jsonrpc":"2.0","id":2,"method":"resources/read","params":{"name":"status"}}"#,
        );
        assert_eq!(
            response.result,
            Some(json!({ "name": "status", "content": { "state": "ok" } }))
        );
    }

    #[test]
    fn producer_panic_becomes_internal_error() {
        let response = processor().handle(
            r#"{"jsonrpc":"2.0","id":9,"method":"resources/read","params":{"name":"explodes"}}"#,
        );
        assert_eq!(response.id, Some(json!(9)));
        assert_eq!(response.error.unwrap().code, codes::INTERNAL_ERROR);
    }

    #[test]
    fn producer_error_becomes_internal_error() {
        let response = processor().handle(
            r#"{"jsonrpc":"2.0","id":9,"method":"resources/read","params":{"name":"fails"}}"#,
        );
        let error = response.error.unwrap();
        assert_eq!(error.code, codes::INTERNAL_ERROR);
        assert!(error.message.contains("fails"));
    }

    #[test]
    fn unknown_method_references_name() {
        let response = processor().handle(r#"{"jsonrpc":"2.0","id":3,"method":"frobnicate"}"#);
        let error = response.error.unwrap();
        assert_eq!(error.code, codes::METHOD_NOT_FOUND);
        assert!(error.message.contains("frobnicate"));
    }
}
