pub mod processor;
pub mod protocol;
pub mod registry;
pub mod resources;

pub use processor::McpProcessor;
pub use registry::{ResourceDescriptor, ResourceRegistry};
