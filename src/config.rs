//! Server configuration, read from `STACKINABOX__*` environment variables
//! (an optional `.env` file is loaded first).

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid socket address: {0}")]
    InvalidAddress(#[from] std::net::AddrParseError),
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind to
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// `SERVER_NAME` reported to services
    #[serde(default = "default_server_name")]
    pub server_name: String,

    /// Path the admin API is mounted under
    #[serde(default = "default_admin_base_uri")]
    pub admin_base_uri: String,

    /// Log filter directive, used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_server_name() -> String {
    "localhost".to_string()
}

fn default_admin_base_uri() -> String {
    "admin".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            server_name: default_server_name(),
            admin_base_uri: default_admin_base_uri(),
            log_level: default_log_level(),
        }
    }
}

impl ServerConfig {
    /// Loads `.env` when present, then `STACKINABOX__PORT=9000` style variables.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_source(config::Environment::with_prefix("STACKINABOX").separator("__"))
    }

    fn from_source<T>(source: T) -> Result<Self, ConfigError>
    where
        T: config::Source + Send + Sync + 'static,
    {
        let config = config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        self.socket_addr()?;
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<std::net::SocketAddr, ConfigError> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}
