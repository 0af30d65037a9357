use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Produces the current content of a resource.
pub type ResourceProducer = Arc<dyn Fn() -> anyhow::Result<Map<String, Value>> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    pub name: String,
    pub description: String,
}

impl ResourceDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

struct RegisteredResource {
    descriptor: ResourceDescriptor,
    producer: ResourceProducer,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("resource '{0}' not found")]
    NotFound(String),
    #[error("resource '{0}' is already registered")]
    Duplicate(String),
    #[error("resource '{name}' failed to produce content: {source}")]
    Producer {
        name: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Ordered resource table.
///
/// Populated at startup, then shared behind an `Arc` and only read.
#[derive(Default)]
pub struct ResourceRegistry {
    resources: Vec<RegisteredResource>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(
        &mut self,
        descriptor: ResourceDescriptor,
        producer: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn() -> anyhow::Result<Map<String, Value>> + Send + Sync + 'static,
    {
        if self.find(&descriptor.name).is_some() {
            return Err(RegistryError::Duplicate(descriptor.name));
        }
        self.resources.push(RegisteredResource {
            descriptor,
            producer: Arc::new(producer),
        });
        Ok(())
    }

    /// Descriptors in registration order.
    pub fn list(&self) -> Vec<ResourceDescriptor> {
        self.resources
            .iter()
            .map(|resource| resource.descriptor.clone())
            .collect()
    }

    pub fn read(&self, name: &str) -> Result<Map<String, Value>, RegistryError> {
        let resource = self
            .find(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
        (resource.producer)().map_err(|source| RegistryError::Producer {
            name: name.to_string(),
            source,
        })
    }

    pub fn count(&self) -> usize {
        self.resources.len()
    }

    fn find(&self, name: &str) -> Option<&RegisteredResource> {
        self.resources
            .iter()
            .find(|resource| resource.descriptor.name == name)
    }
}
