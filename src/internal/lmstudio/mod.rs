pub mod client;
pub mod types;

// Re-export main types
pub use client::{LmStudioClient, LmStudioError};
pub use types::{ChatCompletionRequest, SelectModelRequest};
