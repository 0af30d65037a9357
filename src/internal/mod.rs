pub mod config;
pub mod lmstudio;
pub mod logger;
pub mod mcp;
pub mod server;
pub mod transport;
