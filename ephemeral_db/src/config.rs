//! Configuration handling for ephemeral_db

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::db::engine::EngineKind;
use crate::error::{Error, Result};
use crate::tools::{CodegenSettings, MigrationSettings};

/// Load configuration from a TOML file
pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    let config_str = fs::read_to_string(path).map_err(|e| {
        Error::ConfigError(format!("Failed to read config file {}: {}", path.display(), e))
    })?;

    load_from_str(&config_str)
}

/// Parse configuration from TOML text
pub fn load_from_str(config_str: &str) -> Result<Config> {
    let mut config: Config = toml::from_str(config_str)
        .map_err(|e| Error::ConfigError(format!("Failed to parse config file: {}", e)))?;

    for (name, schema) in config.schemas.iter_mut() {
        schema.name = name.clone();
    }
    config.validate()?;

    Ok(config)
}

/// Represents the complete ephemeral_db configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub schemas: IndexMap<String, SchemaConfiguration>,
    pub logging: Option<LoggingConfig>,
    #[serde(default)]
    pub tools: ToolsConfig,
}

impl Config {
    /// Check invariants serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.database.username.trim().is_empty() {
            return Err(Error::ValidationError("database.username must not be blank".to_string()));
        }
        if self.database.startup_timeout_seconds == 0 {
            return Err(Error::ValidationError(
                "database.startup_timeout_seconds must be greater than zero".to_string(),
            ));
        }
        for (key, schema) in &self.schemas {
            if key.trim().is_empty() {
                return Err(Error::ValidationError(
                    "schema configuration names must not be blank".to_string(),
                ));
            }
            if schema.name != *key {
                return Err(Error::ValidationError(format!(
                    "schema configuration '{}' is registered under key '{}'",
                    schema.name, key
                )));
            }
        }
        Ok(())
    }

    /// Add a schema configuration, keyed by its name
    pub fn add_schema(&mut self, schema: SchemaConfiguration) {
        self.schemas.insert(schema.name.clone(), schema);
    }

    /// Schema configurations in declaration order
    pub fn schema_configurations(&self) -> Vec<&SchemaConfiguration> {
        self.schemas.values().collect()
    }

    /// Driver dependency the code generator needs, explicit or engine default
    pub fn driver_dependency(&self) -> String {
        self.database
            .driver_dependency
            .clone()
            .filter(|dep| !dep.trim().is_empty())
            .unwrap_or_else(|| self.database.engine.default_driver_dependency().to_string())
    }
}

/// Database container configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub engine: EngineKind,
    pub image: Option<String>,
    #[serde(default = "default_credential")]
    pub username: String,
    #[serde(default = "default_credential")]
    pub password: String,
    pub driver_dependency: Option<String>,
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_startup_timeout")]
    pub startup_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            engine: EngineKind::default(),
            image: None,
            username: default_credential(),
            password: default_credential(),
            driver_dependency: None,
            names: Vec::new(),
            host: default_host(),
            startup_timeout_seconds: default_startup_timeout(),
        }
    }
}

fn default_credential() -> String {
    "app".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_startup_timeout() -> u64 {
    60
}

/// One user-declared logical schema
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct SchemaConfiguration {
    /// Filled from the table key when loaded from a file
    #[serde(skip)]
    pub name: String,
    pub input_schema: Option<String>,
    #[serde(default)]
    pub migration: MigrationSpec,
    #[serde(default)]
    pub generator: GeneratorSpec,
}

impl SchemaConfiguration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Top-level input schema first, then the generator's, first non-blank wins
    pub fn effective_input_schema(&self) -> Option<&str> {
        non_blank(self.input_schema.as_deref())
            .or_else(|| non_blank(self.generator.input_schema.as_deref()))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Migration settings of a schema configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct MigrationSpec {
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub options: IndexMap<String, String>,
}

/// Code generator settings of a schema configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct GeneratorSpec {
    pub input_schema: Option<String>,
    #[serde(default)]
    pub input_schemata: Vec<String>,
    pub includes: Option<String>,
    pub excludes: Option<String>,
    pub target_package: Option<String>,
    pub target_directory: Option<String>,
    #[serde(default)]
    pub database_options: IndexMap<String, String>,
    #[serde(default)]
    pub generator_options: IndexMap<String, String>,
    #[serde(default)]
    pub target_options: IndexMap<String, String>,
}

/// Settings of the downstream tools, when configured directly
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ToolsConfig {
    #[serde(default)]
    pub migration: MigrationSettings,
    #[serde(default)]
    pub codegen: IndexMap<String, CodegenSettings>,
}

/// Logging configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    pub file: Option<String>,
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Log to stderr when no file is set
    #[serde(default = "default_console")]
    pub console: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_console() -> bool {
    true
}
