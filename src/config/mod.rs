//! Application configuration.
//!
//! Aggregates configuration from all modules into a single Config struct
//! that can be loaded from YAML files or environment variables.

mod server;
mod storage;

pub use server::{ServerConfig, DEFAULT_USER_HEADER};
pub use storage::{SqliteConfig, StorageConfig, StorageType};

use serde::Deserialize;

use crate::dispatch::StaffPolicy;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "dispatch.yaml";
/// Environment variable for configuration file path.
pub const CONFIG_ENV_VAR: &str = "DISPATCH_CONFIG";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "DISPATCH";
/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "DISPATCH_LOG";

/// Dispatch rules that vary per deployment.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Staff sub-roles allowed to act as in-house drivers.
    pub server_capable_staff_roles: Vec<String>,
    /// `businessId` value clients send for quick deliveries.
    pub quick_business_sentinel: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        let policy = StaffPolicy::default();
        Self {
            server_capable_staff_roles: policy.server_capable_roles,
            quick_business_sentinel: policy.quick_business_sentinel,
        }
    }
}

impl DispatchConfig {
    pub fn staff_policy(&self) -> StaffPolicy {
        StaffPolicy {
            server_capable_roles: self.server_capable_staff_roles.clone(),
            quick_business_sentinel: self.quick_business_sentinel.clone(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Dispatch rules.
    pub dispatch: DispatchConfig,
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// Configuration sources (in order of priority, later overrides earlier):
    /// 1. `dispatch.yaml` in current directory (if exists)
    /// 2. File specified by `path` argument (if provided)
    /// 3. File specified by `CONFIG_ENV_VAR` environment variable (if set)
    /// 4. Environment variables with `CONFIG_ENV_PREFIX` prefix
    pub fn load(path: Option<&str>) -> Result<Self, Box<dyn std::error::Error>> {
        use ::config::{Config as ConfigLib, Environment, File, FileFormat};

        let mut builder = ConfigLib::builder()
            .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false));

        if let Some(config_path) = path {
            builder = builder.add_source(File::new(config_path, FileFormat::Yaml).required(true));
        }

        if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
            builder = builder.add_source(File::new(&config_path, FileFormat::Yaml).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("dispatch.server_capable_staff_roles")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        Ok(config)
    }

    /// Create config for testing: in-memory storage, default rules.
    pub fn for_test() -> Self {
        Self {
            storage: StorageConfig {
                storage_type: StorageType::Memory,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}
