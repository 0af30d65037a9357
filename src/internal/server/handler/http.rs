// src/internal/server/handler/http.rs

use axum::{
    body::Body,
    http::{HeaderValue, Request},
    middleware::{self, Next},
    response::{Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tracing::{debug, info, warn};

use crate::internal::config::CorsConfig;
use crate::internal::server::handler::{lm, ws};
use crate::internal::server::AppState;

/// Handler manages HTTP routing and middleware configuration
pub struct Handler {
    cors: CorsConfig,
}

impl Handler {
    pub fn new(cors: CorsConfig) -> Self {
        Self { cors }
    }

    /// Build the full router: health, the MCP socket and the LM Studio API.
    pub fn create_http_router(&self, state: AppState) -> Router {
        let lm_routes = Router::new()
            .route("/models", get(lm::list_models))
            .route("/selection", get(lm::get_selection))
            .route("/select", post(lm::select_model))
            .route("/chat", post(lm::chat_completion));

        let router = Router::new()
            .route("/health", get(health))
            .route("/mcp", get(ws::mcp_socket))
            .nest("/lm", lm_routes)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(middleware::from_fn(Self::log_requests))
                    .layer(self.cors_layer()),
            );

        info!(
            "HTTP handler created, allowed origins: {:?}",
            self.cors.allowed_origins()
        );
        router
    }

    /// CORS for the frontend dev server; credentials allowed, methods and
    /// headers mirrored from the preflight request.
    fn cors_layer(&self) -> CorsLayer {
        let origins: Vec<HeaderValue> = self
            .cors
            .allowed_origins()
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("Ignoring invalid CORS origin: {:?}", origin);
                    None
                }
            })
            .collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_credentials(true)
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request())
    }

    /// Middleware to log HTTP requests
    async fn log_requests(request: Request<Body>, next: Next) -> Response {
        let method = request.method().clone();
        let uri = request.uri().clone();
        let version = request.version();

        debug!("→ {} {} {:?}", method, uri, version);

        let response = next.run(request).await;

        debug!("← {} {}", response.status(), uri);

        response
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
