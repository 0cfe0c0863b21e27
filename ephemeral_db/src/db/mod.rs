//! Database module for ephemeral_db
//!
//! This module handles the engine profiles, the container lifecycle and the
//! provisioning service built on top of them.

pub mod connection;
pub mod container;
pub mod engine;
pub mod service;

// Re-export key types
pub use connection::{ConnectTarget, DatabaseConnection};
pub use container::{ContainerRequest, ContainerRuntime, DockerCli, RunningContainer};
pub use engine::{EngineKind, SchemaFamily};
pub use service::{
    AdminConnector, AdminSession, ConnectionParameters, ContainerDatabaseService,
    ProvisioningSettings,
    SqlxConnector,
};
