use anyhow::Context;
use clap::{Arg, ArgMatches, Command};

use crate::internal::config::AppConfig;

pub fn build_cli() -> Command {
    // Leak the version string to get a 'static lifetime
    let version: &'static str =
        Box::leak(crate::internal::config::get_version_info().into_boxed_str());

    Command::new("local-llm-backend")
        .version(version)
        .about("Local LLM development backend: health, LM Studio proxy and MCP WebSocket")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Path to a config file (TOML, YAML or JSON)"),
        )
        .arg(
            Arg::new("host")
                .long("host")
                .help("Bind host, overrides HOST and the config file"),
        )
        .arg(
            Arg::new("port")
                .long("port")
                .short('p')
                .value_parser(clap::value_parser!(u16))
                .help("Bind port, overrides PORT and the config file"),
        )
}

pub fn parse_config(matches: &ArgMatches) -> anyhow::Result<AppConfig> {
    let config_file = matches.get_one::<String>("config").map(String::as_str);

    let mut config = AppConfig::load(config_file).context("Failed to load configuration")?;
    apply_overrides(&mut config, matches);
    Ok(config)
}

/// CLI flags win over every other configuration source.
pub fn apply_overrides(config: &mut AppConfig, matches: &ArgMatches) {
    if let Some(host) = matches.get_one::<String>("host") {
        config.server.host = host.clone();
    }
    if let Some(port) = matches.get_one::<u16>("port") {
        config.server.port = *port;
    }
}
