//! Configuration management for RAX File Manager
//!
//! Values come from an optional `config.toml`, overridden by `RAX_FM_*`
//! environment variables. Everything here is read once at startup.

use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MAX_UPLOAD_SIZE_MB: u64 = 10;
pub const DEFAULT_FOLDER_NAME: &str = "New Folder";

/// Complete server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// IP address to bind the HTTP listener
    pub bind_address: String,

    /// Port for the HTTP listener
    pub port: u16,

    /// Root boundary. `None` selects the platform default.
    /// Environment: RAX_FM_SERVER_ROOT
    pub server_root: Option<String>,

    /// Maximum accepted request body for uploads, in MB
    pub max_upload_size_mb: u64,

    /// Base name used when a folder is created without a name
    pub default_folder_name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            port: DEFAULT_PORT,
            server_root: None,
            max_upload_size_mb: DEFAULT_MAX_UPLOAD_SIZE_MB,
            default_folder_name: DEFAULT_FOLDER_NAME.to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from config.toml with environment overrides
    pub fn load() -> Result<Self, config::ConfigError> {
        // Try the packaged path first, then the working directory
        let config_paths = ["rax-file-manager/config", "config"];

        let mut builder = Config::builder()
            .set_default("bind_address", DEFAULT_BIND_ADDRESS)?
            .set_default("port", DEFAULT_PORT as i64)?
            .set_default("max_upload_size_mb", DEFAULT_MAX_UPLOAD_SIZE_MB as i64)?
            .set_default("default_folder_name", DEFAULT_FOLDER_NAME)?;

        for config_path in &config_paths {
            builder = builder.add_source(File::with_name(config_path).required(false));
        }

        let settings = builder
            .add_source(Environment::with_prefix("RAX_FM"))
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.port == 0 {
            return Err(config::ConfigError::Message("port cannot be 0".into()));
        }

        if self.bind_address.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "bind_address cannot be empty".into(),
            ));
        }

        if matches!(&self.server_root, Some(root) if root.trim().is_empty()) {
            return Err(config::ConfigError::Message(
                "server_root cannot be empty when set".into(),
            ));
        }

        if self.max_upload_size_mb == 0 {
            return Err(config::ConfigError::Message(
                "max_upload_size_mb must be greater than 0".into(),
            ));
        }

        let name = self.default_folder_name.trim();
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(config::ConfigError::Message(
                "default_folder_name must be a single path segment".into(),
            ));
        }

        Ok(())
    }

    /// Get bind address and port as socket address
    pub fn listen_socket(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Get the root boundary, falling back to the platform default
    pub fn server_root_path(&self) -> PathBuf {
        match &self.server_root {
            Some(root) => PathBuf::from(root),
            None => default_server_root(),
        }
    }

    /// Get maximum upload size in bytes
    pub fn max_upload_size_bytes(&self) -> usize {
        (self.max_upload_size_mb as usize).saturating_mul(1024 * 1024)
    }
}

/// The user's documents directory, or the temp directory when there is none
fn default_server_root() -> PathBuf {
    dirs::document_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Documents")))
        .unwrap_or_else(std::env::temp_dir)
}
