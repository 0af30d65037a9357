// src/internal/lmstudio/types.rs

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Id of a model entry as returned by `/v1/models`.
pub fn model_id(model: &Value) -> Option<&str> {
    model.get("id").and_then(Value::as_str)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectModelRequest {
    pub model: String,
}

/// OpenAI-style chat completion body.
///
/// Unset options are not forwarded; unknown fields are passed through.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub messages: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelListResponse {
    pub models: Vec<Value>,
    pub selected_model: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionResponse {
    pub selected_model: Option<String>,
}
