pub mod http;
pub mod lm;
pub mod ws;

pub use http::Handler;
