// src/internal/lmstudio/client.rs

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use anyhow::Context;
use reqwest::Client;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::internal::config::LmStudioConfig;
use crate::internal::lmstudio::types::model_id;

const MODELS_ENDPOINT: &str = "/v1/models";
const CHAT_ENDPOINT: &str = "/v1/chat/completions";

#[derive(Debug, thiserror::Error)]
pub enum LmStudioError {
    #[error("LM Studio {endpoint} responded with {status}: {body}")]
    Upstream {
        endpoint: &'static str,
        status: u16,
        body: String,
    },
    #[error("LM Studio {endpoint} request failed: {source}")]
    Request {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("Unexpected models payload from LM Studio")]
    UnexpectedPayload,
    #[error("Model '{0}' not available in LM Studio")]
    ModelUnavailable(String),
    #[error("No model supplied and no model has been selected")]
    NoModelSelected,
}

impl LmStudioError {
    /// Upstream HTTP status, if LM Studio answered at all.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            LmStudioError::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the caller, not LM Studio, is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            LmStudioError::ModelUnavailable(_) | LmStudioError::NoModelSelected
        )
    }
}

#[derive(Debug, Default)]
struct ModelState {
    models: Vec<Value>,
    selected: Option<String>,
}

/// Thin client for the LM Studio OpenAI-compatible API.
///
/// Remembers the last model list and the selected model.
pub struct LmStudioClient {
    client: Client,
    base_url: String,
    list_timeout: Duration,
    chat_timeout: Duration,
    state: RwLock<ModelState>,
}

impl LmStudioClient {
    pub fn new(cfg: &LmStudioConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            list_timeout: cfg.list_timeout(),
            chat_timeout: cfg.chat_timeout(),
            state: RwLock::new(ModelState::default()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn selected_model(&self) -> Option<String> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .selected
            .clone()
    }

    /// Ids of the models seen in the last successful listing.
    pub fn cached_model_ids(&self) -> Vec<String> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .models
            .iter()
            .map(|model| model_id(model).unwrap_or("?").to_string())
            .collect()
    }

    /// Fetch `/v1/models` and refresh the cache.
    ///
    /// Drops the selection if the selected model disappeared.
    pub async fn list_models(&self) -> Result<Vec<Value>, LmStudioError> {
        let response = self
            .client
            .get(self.url(MODELS_ENDPOINT))
            .timeout(self.list_timeout)
            .send()
            .await
            .map_err(|source| LmStudioError::Request {
                endpoint: MODELS_ENDPOINT,
                source,
            })?;
        let response = Self::check_status(MODELS_ENDPOINT, response).await?;

        let payload: Value = response
            .json()
            .await
            .map_err(|_| LmStudioError::UnexpectedPayload)?;
        let models = match payload {
            Value::Object(mut body) => body.remove("data"),
            list @ Value::Array(_) => Some(list),
            _ => None,
        };
        let Some(Value::Array(models)) = models else {
            return Err(LmStudioError::UnexpectedPayload);
        };

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(selected) = &state.selected {
            if !models.iter().any(|m| model_id(m) == Some(selected.as_str())) {
                info!("Selected model '{}' is no longer available", selected);
                state.selected = None;
            }
        }
        state.models = models.clone();
        debug!("LM Studio reports {} models", models.len());

        Ok(models)
    }

    /// Select a model for later chat requests.
    pub async fn select_model(&self, id: &str) -> Result<String, LmStudioError> {
        let cache_empty = self
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .models
            .is_empty();
        if cache_empty {
            self.list_models().await?;
        }

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if !state.models.iter().any(|m| model_id(m) == Some(id)) {
            return Err(LmStudioError::ModelUnavailable(id.to_string()));
        }
        state.selected = Some(id.to_string());
        info!("Selected model '{}'", id);

        Ok(id.to_string())
    }

    /// Forward a chat completion, defaulting `model` to the selection.
    pub async fn create_chat_completion(
        &self,
        mut payload: Map<String, Value>,
    ) -> Result<Value, LmStudioError> {
        let requested = payload
            .get("model")
            .and_then(Value::as_str)
            .filter(|model| !model.is_empty())
            .map(str::to_string);
        let model = requested
            .or_else(|| self.selected_model())
            .ok_or(LmStudioError::NoModelSelected)?;
        payload.insert("model".to_string(), Value::String(model.clone()));

        info!("Forwarding chat completion to model '{}'", model);

        let response = self
            .client
            .post(self.url(CHAT_ENDPOINT))
            .timeout(self.chat_timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|source| LmStudioError::Request {
                endpoint: CHAT_ENDPOINT,
                source,
            })?;
        let response = Self::check_status(CHAT_ENDPOINT, response).await?;

        response
            .json()
            .await
            .map_err(|source| LmStudioError::Request {
                endpoint: CHAT_ENDPOINT,
                source,
            })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    async fn check_status(
        endpoint: &'static str,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, LmStudioError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(LmStudioError::Upstream {
            endpoint,
            status: status.as_u16(),
            body,
        })
    }
}
