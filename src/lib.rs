pub mod cli;
pub mod internal;

// Re-export commonly used types
pub use internal::config::AppConfig;
pub use internal::server::{create_server, Server};
