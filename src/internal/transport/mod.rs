use async_trait::async_trait;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod session;
pub mod websocket;

/// Transport abstraction for one client connection.
#[async_trait]
pub trait Transport: Send {
    /// Read the next text frame.
    ///
    /// Control frames are consumed silently. `Closed` means the peer went
    /// away; `InvalidFrame` means a data frame arrived that is not text.
    async fn read_message(&mut self) -> Result<String, TransportError>;

    /// Write one text frame
    async fn write_message(&mut self, data: &str) -> Result<(), TransportError>;

    /// Flush any buffered data
    async fn flush(&mut self) -> Result<(), TransportError>;

    /// Check if transport is still connected
    fn is_connected(&self) -> bool;
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] axum::Error),
    #[error("Connection closed")]
    Closed,
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),
}
