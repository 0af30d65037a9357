use local_llm_backend::cli::{build_cli, parse_config};
use local_llm_backend::internal::server::create_server;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments first
    let matches = build_cli().get_matches();
    let config = match parse_config(&matches) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    if let Err(e) = local_llm_backend::internal::logger::init_logger(&config.logging) {
        eprintln!("Failed to initialize logger: {:#}", e);
        std::process::exit(1);
    }

    info!("Starting local LLM backend");
    info!(
        "Version: {}",
        local_llm_backend::internal::config::get_version_info()
    );

    let server = match create_server(config) {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to create server: {:#}", e);
            std::process::exit(1);
        }
    };

    info!("Server initialized with {} resources", server.resource_count());

    if let Err(e) = server.start_with_graceful_shutdown().await {
        error!("Server error: {:#}", e);
        std::process::exit(1);
    }

    info!("Server shutdown complete");
    Ok(())
}
