//! ephemeral_db: a throwaway database container for build steps
//!
//! ephemeral_db starts one database container per build, creates every
//! logical schema the build asks for exactly once, and hands the resulting
//! connection and per-schema settings to a migration runner and a code
//! generator.

// Lets `#[derive(DynamicSettings)]` refer to `::ephemeral_db` from inside this crate.
extern crate self as ephemeral_db;

pub mod config;
pub mod db;
pub mod error;
pub mod plan;
pub mod propagate;
pub mod session;
pub mod tools;
pub mod utils;

#[cfg(test)]
mod test;

// Re-export main types for easier access
pub use config::{Config, SchemaConfiguration};
pub use db::engine::EngineKind;
pub use db::service::{ConnectionParameters, ContainerDatabaseService};
pub use error::{Error, Result};
pub use plan::names::ResolvedSchemaSet;
pub use propagate::setters::DynamicSettings;
pub use session::BuildSession;
pub use tools::{CodegenSettings, MigrationSettings};

// Used by `#[derive(DynamicSettings)]` expansions.
#[doc(hidden)]
pub mod __private {
    pub use once_cell::sync::Lazy;
}

use std::sync::Arc;

/// Load a configuration file and set up a session for the requested steps
pub fn init(config_path: &str, requested_steps: Vec<String>) -> Result<BuildSession> {
    let config = config::load_from_file(config_path)?;
    let service = ContainerDatabaseService::new(&config.database);
    Ok(BuildSession::new(Arc::new(config), Arc::new(service), requested_steps))
}
