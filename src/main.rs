//! RAX File Manager - Entry Point
//!
//! Serves a directory tree over HTTP: browse, download (folders as ZIP),
//! upload, delete and create folders, confined to a single root directory.

use log::{error, info};

use rax_file_manager::Server;
use rax_file_manager::config::ServerConfig;

#[tokio::main]
async fn main() {
    // Initialize the logger (env_logger picks up RUST_LOG environment variable)
    env_logger::init();

    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    info!("Launching file manager...");

    let server = match Server::new(config).await {
        Ok(server) => server,
        Err(e) => {
            error!("Server startup failed: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.start().await {
        error!("Server stopped: {}", e);
        std::process::exit(1);
    }
}
