//! Planning module for ephemeral_db
//!
//! Works out which schema names a build needs and which schema configuration a
//! build step belongs to. Nothing in here holds state.

pub mod names;
pub mod resolver;
pub mod selector;

// Re-export key types
pub use names::{normalize, NameSet, ResolvedSchemaSet, DEFAULT_SCHEMA_NAME};
pub use resolver::resolve_schema_names;
pub use selector::{
    bare_step_name, find_configuration_for_step, is_generation_step, select_active_configurations,
    step_name_for, MAIN_CONFIGURATION, MIGRATE_STEP,
};
