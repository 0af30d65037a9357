//! Built-in resources exposed over `resources/list` and `resources/read`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};

use crate::internal::lmstudio::LmStudioClient;
use crate::internal::mcp::registry::{RegistryError, ResourceDescriptor, ResourceRegistry};

pub const STATUS_RESOURCE: &str = "status";

/// Build the registry served by every connection.
///
/// `status` content depends only on the model cache and `started_at`, so
/// repeated reads are equal until the model state changes.
pub fn default_registry(
    models: Arc<LmStudioClient>,
    started_at: DateTime<Utc>,
) -> Result<ResourceRegistry, RegistryError> {
    let mut registry = ResourceRegistry::new();
    registry.register(
        ResourceDescriptor::new(STATUS_RESOURCE, "Static server status resource."),
        move || Ok(status_content(&models, &started_at)),
    )?;
    Ok(registry)
}

fn status_content(models: &LmStudioClient, started_at: &DateTime<Utc>) -> Map<String, Value> {
    let mut content = Map::new();
    content.insert("state".to_string(), json!("ok"));
    content.insert(
        "details".to_string(),
        json!({
            "models_loaded": models.cached_model_ids(),
            "selected_model": models.selected_model(),
            "started_at": started_at.to_rfc3339(),
        }),
    );
    content
}
