// Configuration module entry point
// Loads settings from an optional file, the environment and built-in defaults

mod types;

use std::net::SocketAddr;

use crate::app::AppSettings;
use crate::error::ServerError;

pub use types::{Config, HttpConfig, LayoutConfig, LoggingConfig, PerformanceConfig, ServerConfig};

/// Default config file name (without extension)
pub const DEFAULT_CONFIG_PATH: &str = "config";

impl Config {
    /// Load configuration from the default `config.toml`, if present
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from specified file path (without extension)
    ///
    /// Environment variables override file values, e.g.
    /// `HXLAYOUT_SERVER__PORT=9000`.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("HXLAYOUT")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.show_headers", false)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.server_name", "hxlayout")?
            .set_default("http.max_body_size", 1_048_576)? // 1MB
            .set_default("layout.body_target", crate::hx::DEFAULT_BODY_TARGET)?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, ServerError> {
        let addr = format!("{}:{}", self.server.host, self.server.port);
        addr.parse()
            .map_err(|e| ServerError::Addr(format!("{addr} ({e})")))
    }

    /// Per-request settings handed to the app
    pub fn app_settings(&self) -> AppSettings {
        AppSettings {
            server_name: self.http.server_name.clone(),
            max_body_size: self.http.max_body_size,
            body_target: self.layout.body_target.clone(),
            access_log: self.logging.access_log,
            access_log_format: self.logging.access_log_format.clone(),
            show_headers: self.logging.show_headers,
        }
    }
}
