use serde_json::json;

pub fn ping_request(id: i32) -> serde_json::Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "ping"
    })
}

pub fn list_resources_request(id: i32) -> serde_json::Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "resources/list",
        "params": {}
    })
}

pub fn read_resource_request(id: i32, name: &str) -> serde_json::Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "resources/read",
        "params": { "name": name }
    })
}

pub fn unknown_method_request(id: i32) -> serde_json::Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "frobnicate",
        "params": {}
    })
}

/// Two OpenAI-style model entries as LM Studio returns them.
pub fn models_payload() -> serde_json::Value {
    json!({
        "object": "list",
        "data": [
            { "id": "qwen2.5-7b-instruct", "object": "model", "owned_by": "organization_owner" },
            { "id": "llama-3.2-3b", "object": "model", "owned_by": "organization_owner" }
        ]
    })
}
