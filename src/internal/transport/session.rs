use std::sync::Arc;

use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::internal::{
    mcp::{
        processor::McpProcessor,
        protocol::{JsonRpcError, JsonRpcNotification, JsonRpcResponse},
    },
    transport::{Transport, TransportError},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Open,
    Closed,
}

/// One client connection: greet, then answer every frame in order until the
/// peer leaves or the transport fails.
pub struct ConnectionSession<T: Transport> {
    id: Uuid,
    transport: Option<T>,
    processor: Arc<McpProcessor>,
    state: SessionState,
    send_welcome: bool,
    frames_handled: u64,
}

impl<T: Transport> ConnectionSession<T> {
    pub fn new(transport: T, processor: Arc<McpProcessor>) -> Self {
        Self {
            id: Uuid::new_v4(),
            transport: Some(transport),
            processor,
            state: SessionState::Connecting,
            send_welcome: true,
            frames_handled: 0,
        }
    }

    /// Skip the `session/welcome` notification.
    pub fn without_welcome(mut self) -> Self {
        self.send_welcome = false;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn frames_handled(&self) -> u64 {
        self.frames_handled
    }

    /// Drive the session to `Closed`.
    ///
    /// Returns `Ok` when the client closed the connection and the transport
    /// error otherwise. The transport is dropped either way.
    pub async fn run(&mut self) -> Result<(), TransportError> {
        let span = info_span!("session", id = %self.id);
        let result = self.drive().instrument(span).await;

        self.state = SessionState::Closed;
        self.transport = None;
        result
    }

    async fn drive(&mut self) -> Result<(), TransportError> {
        let Some(transport) = self.transport.as_mut() else {
            return Ok(());
        };

        if self.send_welcome {
            let welcome = serde_json::to_string(&JsonRpcNotification::welcome())
                .map_err(std::io::Error::from)?;
            transport.write_message(&welcome).await?;
            transport.flush().await?;
        }
        self.state = SessionState::Open;
        info!("Session open");

        loop {
            if !transport.is_connected() {
                info!("Transport disconnected");
                return Ok(());
            }

            let response = match transport.read_message().await {
                Ok(frame) => {
                    debug!("Received {} bytes", frame.len());
                    self.processor.handle(&frame)
                }
                Err(TransportError::Closed) => {
                    info!("Client disconnected after {} frames", self.frames_handled);
                    return Ok(());
                }
                Err(TransportError::InvalidFrame(reason)) => {
                    warn!("Rejecting frame: {}", reason);
                    JsonRpcResponse::failure(None, JsonRpcError::parse_error(reason))
                }
                Err(e) => {
                    warn!("Read failed: {}", e);
                    return Err(e);
                }
            };

            let output = McpProcessor::serialize_response(&response);
            transport.write_message(&output).await?;
            transport.flush().await?;
            self.frames_handled += 1;
        }
    }
}
