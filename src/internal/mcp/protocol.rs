use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

/// Standard JSON-RPC error codes plus the MCP resource-not-found code.
pub mod codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
    pub const RESOURCE_NOT_FOUND: i32 = -32002;
}

/// Raw JSON-RPC request envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// Raw JSON-RPC response envelope.
///
/// `id` is always serialized; it is `null` when the request carried none or
/// could not be read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Option<Value>, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn parse_error(detail: impl std::fmt::Display) -> Self {
        Self::new(codes::PARSE_ERROR, format!("Parse error: {}", detail))
    }

    pub fn invalid_request(detail: impl Into<String>) -> Self {
        Self::new(codes::INVALID_REQUEST, detail)
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(codes::METHOD_NOT_FOUND, format!("Unknown method: {}", method))
    }

    pub fn invalid_params(detail: impl Into<String>) -> Self {
        Self::new(codes::INVALID_PARAMS, detail)
    }

    pub fn internal_error(detail: impl Into<String>) -> Self {
        Self::new(codes::INTERNAL_ERROR, detail)
    }

    pub fn resource_not_found(name: &str) -> Self {
        Self::new(
            codes::RESOURCE_NOT_FOUND,
            format!("Resource not found: {}", name),
        )
        .with_data(serde_json::json!({ "name": name }))
    }
}

/// Server-initiated message without an id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcNotification {
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
        }
    }

    /// Sent once when a session opens.
    pub fn welcome() -> Self {
        Self::new(
            "session/welcome",
            Some(serde_json::json!({ "message": "MCP server ready" })),
        )
    }
}

/// Supported method names.
#[derive(Debug, Clone, PartialEq)]
pub enum McpMethod {
    Ping,
    ResourcesList,
    ResourcesRead,
    Unknown(String),
}

impl From<&str> for McpMethod {
    fn from(s: &str) -> Self {
        match s {
            "ping" => McpMethod::Ping,
            "resources/list" => McpMethod::ResourcesList,
            "resources/read" => McpMethod::ResourcesRead,
            other => McpMethod::Unknown(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReadResourceParams {
    pub name: String,
}

/// A request whose params have been checked against its method.
#[derive(Debug, Clone, PartialEq)]
pub enum McpRequest {
    Ping,
    ResourcesList,
    ResourcesRead(ReadResourceParams),
}

impl McpRequest {
    /// Validate `params` for `method`.
    ///
    /// Methods without params accept an absent, `null` or object `params`.
    pub fn from_parts(method: &str, params: Option<&Value>) -> Result<Self, JsonRpcError> {
        match McpMethod::from(method) {
            McpMethod::Ping => {
                expect_no_params(params)?;
                Ok(McpRequest::Ping)
            }
            McpMethod::ResourcesList => {
                expect_no_params(params)?;
                Ok(McpRequest::ResourcesList)
            }
            McpMethod::ResourcesRead => {
                let params = match params {
                    Some(value @ Value::Object(_)) => value,
                    _ => {
                        return Err(JsonRpcError::invalid_params(
                            "resources/read requires params with a 'name' field",
                        ))
                    }
                };
                let params = ReadResourceParams::deserialize(params).map_err(|e| {
                    JsonRpcError::invalid_params(format!("Invalid params: {}", e))
                })?;
                Ok(McpRequest::ResourcesRead(params))
            }
            McpMethod::Unknown(name) => Err(JsonRpcError::method_not_found(&name)),
        }
    }
}

fn expect_no_params(params: Option<&Value>) -> Result<(), JsonRpcError> {
    match params {
        None | Some(Value::Null) | Some(Value::Object(_)) => Ok(()),
        Some(_) => Err(JsonRpcError::invalid_params("params must be an object")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn response_always_carries_id_field() {
        let response = JsonRpcResponse::success(None, json!({ "pong": true }));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value, json!({ "jsonrpc": "2.0", "id": null, "result": { "pong": true } }));
    }

    #[test]
    fn error_response_omits_result() {
        let response = JsonRpcResponse::failure(Some(json!("a")), JsonRpcError::method_not_found("x"));
        let value = serde_json::to_value(&response).unwrap();
        assert!(value.get("result").is_none());
        assert_eq!(value["error"]["code"], -32601);
        assert_eq!(value["error"]["message"], "Unknown method: x");
    }

    #[test]
    fn read_requires_string_name() {
        let err = McpRequest::from_parts("resources/read", None).unwrap_err();
        assert_eq!(err.code, codes::INVALID_PARAMS);

        let err = McpRequest::from_parts("resources/read", Some(&json!({ "name": 7 }))).unwrap_err();
        assert_eq!(err.code, codes::INVALID_PARAMS);

        let err = McpRequest::from_parts("resources/read", Some(&json!(["status"]))).unwrap_err();
        assert_eq!(err.code, codes::INVALID_PARAMS);

        let ok = McpRequest::from_parts("resources/read", Some(&json!({ "name": "status" }))).unwrap();
        assert_eq!(
            ok,
            McpRequest::ResourcesRead(ReadResourceParams { name: "status".into() })
        );
    }

    #[test]
    fn ping_rejects_non_object_params() {
        assert_eq!(McpRequest::from_parts("ping", None).unwrap(), McpRequest::Ping);
        assert_eq!(McpRequest::from_parts("ping", Some(&json!({}))).unwrap(), McpRequest::Ping);
        let err = McpRequest::from_parts("ping", Some(&json!(42))).unwrap_err();
        assert_eq!(err.code, codes::INVALID_PARAMS);
    }

    #[test]
    fn unknown_method_names_the_method() {
        let err = McpRequest::from_parts("frobnicate", None).unwrap_err();
        assert_eq!(err.code, codes::METHOD_NOT_FOUND);
        assert!(err.message.contains("frobnicate"));
    }
}
