pub mod _config;

pub use _config::{
    get_version_info, AppConfig, CorsConfig, LmStudioConfig, LoggingConfig, ServerConfig,
    ENV_PREFIX, VERSION,
};
