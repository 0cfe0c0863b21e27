//! Tools module for ephemeral_db
//!
//! Settings objects of the two downstream tools: the migration runner and the
//! code generator. They are filled in by the propagation engine and handed
//! to the tools as-is.

pub mod codegen;
pub mod migration;

// Re-export key types
pub use codegen::{CodegenSettings, DatabaseSection, GeneratorSection, JdbcSection, TargetSection};
pub use migration::MigrationSettings;
