use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures_util::SinkExt;
use tracing::debug;

use super::{Transport, TransportError};

/// Text-frame transport over an accepted axum WebSocket.
pub struct WebSocketTransport {
    socket: WebSocket,
    connected: bool,
}

impl WebSocketTransport {
    pub fn new(socket: WebSocket) -> Self {
        Self {
            socket,
            connected: true,
        }
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn read_message(&mut self) -> Result<String, TransportError> {
        loop {
            let message = match self.socket.recv().await {
                Some(Ok(message)) => message,
                Some(Err(e)) => {
                    self.connected = false;
                    return Err(TransportError::WebSocket(e));
                }
                None => {
                    self.connected = false;
                    return Err(TransportError::Closed);
                }
            };

            match message {
                Message::Text(text) => return Ok(text.as_str().to_owned()),
                // Binary frames holding UTF-8 are accepted as text.
                Message::Binary(bytes) => {
                    return String::from_utf8(bytes.to_vec()).map_err(|_| {
                        TransportError::InvalidFrame("binary frame is not valid UTF-8".into())
                    })
                }
                Message::Close(frame) => {
                    debug!("Client sent close frame: {:?}", frame);
                    self.connected = false;
                    return Err(TransportError::Closed);
                }
                Message::Ping(_) | Message::Pong(_) => continue,
            }
        }
    }

    async fn write_message(&mut self, data: &str) -> Result<(), TransportError> {
        if !self.connected {
            return Err(TransportError::Closed);
        }
        if let Err(e) = self.socket.send(Message::Text(data.to_owned().into())).await {
            self.connected = false;
            return Err(TransportError::WebSocket(e));
        }
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), TransportError> {
        SinkExt::flush(&mut self.socket).await.map_err(|e| {
            self.connected = false;
            TransportError::WebSocket(e)
        })
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}
