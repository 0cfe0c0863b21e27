//! Propagation module for ephemeral_db
//!
//! This module moves connection parameters and schema settings into the
//! downstream tools' settings objects.

pub mod engine;
pub mod setters;
pub mod targets;

// Re-export key types
pub use engine::{configure_codegen, configure_migration, GenerationContext};
pub use setters::{
    apply_setter_map, parse_flag, setter_name_for, DynamicSettings, OptionValue, Setter,
    SetterTable,
};
pub use targets::{
    CodegenRegistry, CodegenTarget, ConnectionTarget, DatabaseTarget, MigrationTarget, OutputTarget,
};
