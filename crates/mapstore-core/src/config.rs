//! Configuration management for mapstore
//!
//! Sources, lowest precedence first:
//! - Hardcoded defaults
//! - Config file named by `MAPSTORE_CONFIG`, then `./config/mapstore`
//! - Environment variables (`MAPSTORE__SERVER__BIND_ADDRESS`, ...)

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

/// Smallest token length accepted, in random bytes before encoding.
pub const MIN_TOKEN_BYTES: usize = 16;

/// Root configuration structure for mapstore
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct MapstoreConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl MapstoreConfig {
    /// Load configuration from defaults, files and environment, then validate.
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Self::set_defaults(Config::builder())?;

        if let Ok(config_path) = std::env::var("MAPSTORE_CONFIG") {
            builder = builder.add_source(File::with_name(&config_path).required(false));
        }

        builder = builder
            .add_source(File::with_name("./config/mapstore").required(false))
            .add_source(
                Environment::with_prefix("MAPSTORE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: MapstoreConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    fn set_defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        builder
            // Server
            .set_default("server.bind_address", "0.0.0.0:8086")?
            .set_default("server.max_body_bytes", 1_048_576_i64)?
            // Auth
            .set_default("auth.enabled", true)?
            .set_default("auth.operator_org", "operator")?
            .set_default("auth.operator_user", "admin")?
            // Store
            .set_default("store.token_bytes", 64_i64)?
            // Logging
            .set_default("logging.level", "info,mapstore=debug")?
            .set_default("logging.json", false)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.bind_address.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::Message(format!(
                "server.bind_address `{}` is not a socket address",
                self.server.bind_address
            )));
        }

        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::Message(
                "server.max_body_bytes must be > 0".to_string(),
            ));
        }

        if self.auth.operator_org.trim().is_empty() || self.auth.operator_user.trim().is_empty() {
            return Err(ConfigError::Message(
                "auth.operator_org and auth.operator_user must not be empty".to_string(),
            ));
        }

        if matches!(&self.auth.operator_token, Some(token) if token.trim().is_empty()) {
            return Err(ConfigError::Message(
                "auth.operator_token must not be blank when set".to_string(),
            ));
        }

        if self.store.token_bytes < MIN_TOKEN_BYTES {
            return Err(ConfigError::Message(format!(
                "store.token_bytes must be >= {MIN_TOKEN_BYTES}"
            )));
        }

        Ok(())
    }

    /// Load configuration from a specific file path, layered over the defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config: MapstoreConfig = Self::set_defaults(Config::builder())?
            .add_source(File::from(path.as_ref()))
            .build()?
            .try_deserialize()?;
        config.validate()?;

        Ok(config)
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Address the REST listener binds to
    pub bind_address: String,

    /// Largest accepted request body
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8086".to_string(),
            max_body_bytes: 1_048_576,
        }
    }
}

/// Token authentication configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// When false every request runs as the operator
    pub enabled: bool,

    /// Operator token to seed at startup; generated when unset
    #[serde(default)]
    pub operator_token: Option<String>,

    /// Name of the bootstrap organization
    pub operator_org: String,

    /// Name of the bootstrap user
    pub operator_user: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            operator_token: None,
            operator_org: "operator".to_string(),
            operator_user: "admin".to_string(),
        }
    }
}

/// Record store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Random bytes per generated token
    pub token_bytes: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { token_bytes: 64 }
    }
}

/// Log output configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info,mapstore=debug".to_string(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configuration() {
        let config = MapstoreConfig::default();

        assert_eq!(config.server.bind_address, "0.0.0.0:8086");
        assert_eq!(config.server.max_body_bytes, 1_048_576);
        assert!(config.auth.enabled);
        assert!(config.auth.operator_token.is_none());
        assert_eq!(config.store.token_bytes, 64);
        assert!(!config.logging.json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_errors() {
        let mut config = MapstoreConfig::default();

        config.server.bind_address = "not an address".to_string();
        assert!(config.validate().is_err());
        config.server.bind_address = "127.0.0.1:0".to_string();
        assert!(config.validate().is_ok());

        config.store.token_bytes = 4;
        assert!(config.validate().is_err());
        config.store.token_bytes = MIN_TOKEN_BYTES;
        assert!(config.validate().is_ok());

        config.auth.operator_token = Some("   ".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file_overrides_defaults() {
        let dir = std::env::temp_dir().join(format!("mapstore-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("mapstore.toml");
        std::fs::write(
            &path,
            "[server]\nbind_address = \"127.0.0.1:9999\"\n\n[auth]\nenabled = false\n",
        )
        .unwrap();

        let config = MapstoreConfig::from_file(&path).unwrap();
        assert_eq!(config.server.bind_address, "127.0.0.1:9999");
        assert!(!config.auth.enabled);
        assert_eq!(config.store.token_bytes, 64);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
