use axum::{
    extract::{State, WebSocketUpgrade},
    response::Response,
};
use tracing::warn;

use crate::internal::server::AppState;
use crate::internal::transport::{
    session::ConnectionSession, websocket::WebSocketTransport,
};

/// `GET /mcp`: upgrade and hand the socket to its own session task.
pub async fn mcp_socket(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| async move {
        let mut session =
            ConnectionSession::new(WebSocketTransport::new(socket), state.processor.clone());
        if let Err(e) = session.run().await {
            warn!("MCP session {} ended with error: {}", session.id(), e);
        }
    })
}
