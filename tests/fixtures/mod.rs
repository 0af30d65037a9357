//! Test fixtures for MCP protocol and HTTP testing

pub mod requests;

use std::sync::Arc;

use local_llm_backend::internal::config::{AppConfig, LmStudioConfig};
use local_llm_backend::internal::lmstudio::LmStudioClient;
use local_llm_backend::internal::mcp::resources::default_registry;
use local_llm_backend::internal::mcp::McpProcessor;

/// Processor over the built-in registry; LM Studio is never contacted.
pub fn test_processor() -> Arc<McpProcessor> {
    let client = Arc::new(LmStudioClient::new(&LmStudioConfig::default()).unwrap());
    let registry = default_registry(client, chrono::Utc::now()).unwrap();
    Arc::new(McpProcessor::new(Arc::new(registry)))
}

/// Config pointing LM Studio at `base_url` (e.g. a wiremock server).
pub fn test_config(base_url: &str) -> AppConfig {
    let mut config = AppConfig::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = 0;
    config.lm_studio.base_url = base_url.to_string();
    config.lm_studio.list_timeout_secs = 2;
    config.lm_studio.chat_timeout_secs = 2;
    config
}
