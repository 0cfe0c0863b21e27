//! Schema name resolution
//!
//! Computes every schema/database name a build invocation needs. The result is
//! a union of all sources; no source overrides another.

use crate::config::SchemaConfiguration;
use crate::plan::names::{NameSet, ResolvedSchemaSet};
use crate::propagate::targets::{CodegenRegistry, CodegenTarget};

/// Union of, in order: the global default names, each configuration's
/// effective input schema, generator input schema and generator input
/// schemata, and whatever input schemas the code generator's own settings
/// already name.
pub fn resolve_schema_names<R>(
    global_names: &[String],
    configurations: &[&SchemaConfiguration],
    foreign: &R,
) -> ResolvedSchemaSet
where
    R: CodegenRegistry + ?Sized,
{
    let mut names = NameSet::default();
    names.extend(global_names);

    for configuration in configurations {
        if let Some(schema) = configuration.effective_input_schema() {
            names.insert(schema);
        }
        // The generator-level input schema is applied as an override during
        // generation even when the top-level one wins, so it must exist too.
        if let Some(schema) = configuration.generator.input_schema.as_deref() {
            names.insert(schema);
        }
        names.extend(&configuration.generator.input_schemata);
    }

    for name in foreign.configuration_names() {
        let Some(settings) = foreign.settings(&name) else {
            continue;
        };
        let database = settings.database();
        if let Some(schema) = database.input_schema() {
            names.insert(schema);
        }
        names.extend(database.input_schemata());
    }

    let resolved = ResolvedSchemaSet::from_names(names);
    tracing::debug!(names = ?resolved.as_slice(), "Resolved schema names");
    resolved
}
