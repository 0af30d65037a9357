//! REST handlers proxying to LM Studio.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::{json, Value};

use crate::internal::lmstudio::{
    types::{ModelListResponse, SelectionResponse},
    ChatCompletionRequest, LmStudioError, SelectModelRequest,
};
use crate::internal::server::AppState;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    LmStudio(#[from] LmStudioError),
    #[error("{0}")]
    Validation(String),
    #[error("{}", .0.body_text())]
    Body(#[from] JsonRejection),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Body(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::LmStudio(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::LmStudio(e) => e
                .upstream_status()
                .and_then(|status| StatusCode::from_u16(status).ok())
                .unwrap_or(StatusCode::BAD_GATEWAY),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!("LM Studio request failed: {}", self);
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

pub async fn list_models(
    State(state): State<AppState>,
) -> Result<Json<ModelListResponse>, ApiError> {
    let models = state.lm_client.list_models().await?;
    Ok(Json(ModelListResponse {
        models,
        selected_model: state.lm_client.selected_model(),
    }))
}

pub async fn get_selection(State(state): State<AppState>) -> Json<SelectionResponse> {
    Json(SelectionResponse {
        selected_model: state.lm_client.selected_model(),
    })
}

pub async fn select_model(
    State(state): State<AppState>,
    request: Result<Json<SelectModelRequest>, JsonRejection>,
) -> Result<Json<SelectionResponse>, ApiError> {
    let Json(request) = request?;
    if request.model.is_empty() {
        return Err(ApiError::Validation("model must not be empty".to_string()));
    }
    let selected = state.lm_client.select_model(&request.model).await?;
    Ok(Json(SelectionResponse {
        selected_model: Some(selected),
    }))
}

pub async fn chat_completion(
    State(state): State<AppState>,
    request: Result<Json<ChatCompletionRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = request?;
    let payload = match serde_json::to_value(&request) {
        Ok(Value::Object(payload)) => payload,
        _ => return Err(ApiError::Validation("invalid chat request".to_string())),
    };
    let completion = state.lm_client.create_chat_completion(payload).await?;
    Ok(Json(completion))
}
