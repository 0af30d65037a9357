use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tracing::debug;

use crate::internal::mcp::protocol::{JsonRpcRequest, JsonRpcResponse};

use super::{Transport, TransportError};

/// Mock transport for testing - allows injecting frames and capturing output
#[derive(Clone, Default)]
pub struct MockTransport {
    /// Queued frames to be "read"; an `Err` is returned as-is.
    pub inputs: Arc<Mutex<VecDeque<Result<String, TransportError>>>>,
    /// Captured outputs
    pub outputs: Arc<Mutex<Vec<String>>>,
    /// Fail every write after this many successful ones.
    pub fail_writes_after: Arc<Mutex<Option<usize>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw text frame
    pub fn queue_input(&self, data: impl Into<String>) {
        self.lock_inputs().push_back(Ok(data.into()));
    }

    /// Queue a JSON-RPC request
    pub fn queue_request(&self, request: &JsonRpcRequest) {
        let json = serde_json::to_string(request).unwrap_or_default();
        self.queue_input(json);
    }

    /// Queue a read failure, e.g. `InvalidFrame` for a non-text frame
    pub fn queue_error(&self, error: TransportError) {
        self.lock_inputs().push_back(Err(error));
    }

    pub fn fail_writes_after(&self, successful: usize) {
        *self
            .fail_writes_after
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(successful);
    }

    /// Get all captured outputs
    pub fn get_outputs(&self) -> Vec<String> {
        self.outputs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Captured outputs that parse as responses (skips notifications)
    pub fn get_responses(&self) -> Vec<JsonRpcResponse> {
        self.get_outputs()
            .iter()
            .filter_map(|data| serde_json::from_str::<serde_json::Value>(data).ok())
            .filter(|value| value.get("method").is_none())
            .filter_map(|value| serde_json::from_value(value).ok())
            .collect()
    }

    fn lock_inputs(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<String, TransportError>>> {
        self.inputs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn read_message(&mut self) -> Result<String, TransportError> {
        match self.lock_inputs().pop_front() {
            Some(frame) => frame,
            None => {
                debug!("MockTransport: no more inputs, returning Closed");
                Err(TransportError::Closed)
            }
        }
    }

    async fn write_message(&mut self, data: &str) -> Result<(), TransportError> {
        let limit = *self
            .fail_writes_after
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut outputs = self.outputs.lock().unwrap_or_else(PoisonError::into_inner);
        if limit.is_some_and(|limit| outputs.len() >= limit) {
            return Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "mock write failure",
            )));
        }
        outputs.push(data.to_string());
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    fn is_connected(&self) -> bool {
        // This mock is always "connected" until inputs are exhausted.
        true
    }
}
