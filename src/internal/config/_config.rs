use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

// Version information from build script - using option_env! for safety
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prefix for environment variables, e.g. `LLM_BACKEND_SERVER__PORT=9000`.
pub const ENV_PREFIX: &str = "LLM_BACKEND";

/// Get version information
pub fn get_version_info() -> String {
    let build_timestamp = option_env!("VERGEN_BUILD_TIMESTAMP").unwrap_or("unknown");
    let build_date = option_env!("VERGEN_BUILD_DATE").unwrap_or("unknown");
    let rustc_semver = option_env!("VERGEN_RUSTC_SEMVER").unwrap_or("unknown");
    let cargo_target_triple = option_env!("VERGEN_CARGO_TARGET_TRIPLE").unwrap_or("unknown");
    let cargo_debug = option_env!("VERGEN_CARGO_DEBUG").unwrap_or("unknown");

    format!(
        "local-llm-backend version {}\n\
         Built: {} ({})\n\
         Rust: {}\n\
         Target: {} (debug: {})",
        VERSION, build_date, build_timestamp, rustc_semver, cargo_target_triple, cargo_debug
    )
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            name: default_name(),
            version: default_version(),
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_port() -> u16 {
    8000
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_name() -> String {
    "local-llm-backend".to_string()
}
fn default_version() -> String {
    VERSION.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_true")]
    pub color: bool,
    #[serde(default)]
    pub output_path: Option<String>,
    #[serde(default)]
    pub append_to_file: bool,
    #[serde(default)]
    pub disable_console: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            color: true,
            output_path: None,
            append_to_file: false,
            disable_console: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "compact".to_string()
}
fn default_true() -> bool {
    true
}

/// Where the upstream LM Studio server lives and how long to wait for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LmStudioConfig {
    #[serde(default = "default_lm_base_url")]
    pub base_url: String,
    #[serde(default = "default_list_timeout")]
    pub list_timeout_secs: u64,
    #[serde(default = "default_chat_timeout")]
    pub chat_timeout_secs: u64,
}

impl Default for LmStudioConfig {
    fn default() -> Self {
        Self {
            base_url: default_lm_base_url(),
            list_timeout_secs: default_list_timeout(),
            chat_timeout_secs: default_chat_timeout(),
        }
    }
}

impl LmStudioConfig {
    pub fn list_timeout(&self) -> Duration {
        Duration::from_secs(self.list_timeout_secs)
    }

    pub fn chat_timeout(&self) -> Duration {
        Duration::from_secs(self.chat_timeout_secs)
    }
}

fn default_lm_base_url() -> String {
    "http://127.0.0.1:1234".to_string()
}
fn default_list_timeout() -> u64 {
    10
}
fn default_chat_timeout() -> u64 {
    60
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    #[serde(default = "default_dev_server_origin")]
    pub dev_server_origin: String,
    #[serde(default)]
    pub additional_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            dev_server_origin: default_dev_server_origin(),
            additional_origins: Vec::new(),
        }
    }
}

impl CorsConfig {
    /// The dev server origin followed by every non-blank additional origin.
    pub fn allowed_origins(&self) -> Vec<String> {
        std::iter::once(self.dev_server_origin.trim().to_string())
            .chain(
                self.additional_origins
                    .iter()
                    .map(|origin| origin.trim().to_string()),
            )
            .filter(|origin| !origin.is_empty())
            .collect()
    }
}

fn default_dev_server_origin() -> String {
    "http://localhost:5173".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub lm_studio: LmStudioConfig,
    #[serde(default)]
    pub cors: CorsConfig,
}

impl AppConfig {
    /// Load configuration from `.env`, an optional config file and the process
    /// environment.
    pub fn load(config_file: Option<&str>) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(ConfigError::Message(format!("invalid .env file: {}", e))),
        }

        let env: HashMap<String, String> = std::env::vars().collect();
        Self::load_from(config_file.map(Path::new), &env)
    }

    /// Build configuration from an explicit environment map.
    ///
    /// Precedence, lowest first: built-in defaults, `config.*` in the working
    /// directory, the file passed in, `LLM_BACKEND_*` variables, then the
    /// unprefixed `HOST`, `PORT`, `LM_STUDIO_BASE_URL`, `VITE_DEV_SERVER` and
    /// `ADDITIONAL_ORIGINS` variables.
    pub fn load_from(
        config_file: Option<&Path>,
        env: &HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("server.port", i64::from(default_port()))?
            .set_default("server.host", default_host())?
            .set_default("server.name", default_name())?
            .set_default("server.version", VERSION)?
            .set_default("logging.level", default_log_level())?
            .set_default("logging.format", default_log_format())?
            .set_default("logging.color", true)?
            .set_default("lm_studio.base_url", default_lm_base_url())?
            .set_default("lm_studio.list_timeout_secs", default_list_timeout() as i64)?
            .set_default("lm_studio.chat_timeout_secs", default_chat_timeout() as i64)?
            .set_default("cors.dev_server_origin", default_dev_server_origin())?
            .set_default("cors.additional_origins", Vec::<String>::new())?
            .add_source(File::with_name("config").required(false));

        if let Some(path) = config_file {
            builder = builder.add_source(File::from(path).required(true));
        }

        let prefixed: HashMap<String, String> = env
            .iter()
            .filter(|(key, _)| key.starts_with(ENV_PREFIX))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        builder = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("cors.additional_origins")
                    .source(Some(prefixed)),
            )
            .set_override_option("server.host", env.get("HOST").cloned())?
            .set_override_option("lm_studio.base_url", env.get("LM_STUDIO_BASE_URL").cloned())?
            .set_override_option("cors.dev_server_origin", env.get("VITE_DEV_SERVER").cloned())?;

        if let Some(port) = env.get("PORT") {
            let port: u16 = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::Message(format!("PORT is not a valid port: {}", port)))?;
            builder = builder.set_override("server.port", i64::from(port))?;
        }

        if let Some(extra) = env.get("ADDITIONAL_ORIGINS") {
            let origins: Vec<String> = extra
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_string)
                .collect();
            builder = builder.set_override("cors.additional_origins", origins)?;
        }

        let app_config: AppConfig = builder.build()?.try_deserialize()?;
        app_config.validate()?;
        Ok(app_config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::Message("server host cannot be empty".to_string()));
        }
        if self.lm_studio.base_url.trim().is_empty() {
            return Err(ConfigError::Message(
                "LM Studio base URL cannot be empty".to_string(),
            ));
        }
        if self.lm_studio.list_timeout_secs == 0 || self.lm_studio.chat_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "LM Studio timeouts must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
