//! Configuration propagation
//!
//! Pushes the provisioned connection and the per-schema settings onto the
//! migration runner's and the code generator's settings objects.

use crate::config::SchemaConfiguration;
use crate::db::service::ConnectionParameters;
use crate::plan::names::{normalize, NameSet};
use crate::propagate::setters::apply_setter_map;
use crate::propagate::targets::{CodegenTarget, MigrationTarget};

/// Configure the migration runner for the selected configurations
///
/// Connection values are overwritten. Locations and schemas are replaced
/// wholesale by the union over `selected`, then each configuration's
/// free-form options are applied.
pub fn configure_migration<M>(
    migration: &mut M,
    connection: &ConnectionParameters,
    selected: &[&SchemaConfiguration],
) where
    M: MigrationTarget + ?Sized,
{
    migration.set_url(&connection.url);
    migration.set_user(&connection.username);
    migration.set_password(&connection.password);

    let mut locations = NameSet::default();
    let mut schemas = NameSet::default();
    for configuration in selected {
        locations.extend(&configuration.migration.locations);
        if let Some(schema) = configuration.effective_input_schema() {
            schemas.insert(schema);
        }
    }

    if !locations.is_empty() {
        migration.set_locations(locations.into_vec());
    }
    if !schemas.is_empty() {
        migration.set_schemas(schemas.into_vec());
    }

    for configuration in selected {
        let applied = apply_setter_map(&mut *migration, &configuration.migration.options);
        tracing::debug!(
            configuration = %configuration.name,
            applied,
            offered = configuration.migration.options.len(),
            "Applied migration options"
        );
    }
}

/// What the engine knows about the database a generation step talks to
#[derive(Debug, Clone)]
pub struct GenerationContext<'a> {
    pub connection: &'a ConnectionParameters,
    pub driver_id: &'a str,
    pub introspection_tool_id: &'a str,
    /// First explicitly configured global name, if any
    pub default_schema: Option<&'a str>,
}

/// Configure one code generator configuration
///
/// Values the user already set on the generator win over defaults; values
/// from the matching schema configuration win over both.
pub fn configure_codegen<C>(
    codegen: &mut C,
    context: &GenerationContext<'_>,
    schema: Option<&SchemaConfiguration>,
) where
    C: CodegenTarget + ?Sized,
{
    let jdbc = codegen.jdbc_mut();
    jdbc.set_url(&context.connection.url);
    jdbc.set_user(&context.connection.username);
    jdbc.set_password(&context.connection.password);
    jdbc.set_driver(context.driver_id);

    let database = codegen.database_mut();
    if is_blank(database.name()) {
        database.set_name(context.introspection_tool_id);
    }

    if is_blank(database.input_schema()) && database.input_schemata().is_empty() {
        let preferred = schema
            .and_then(SchemaConfiguration::effective_input_schema)
            .or(context.default_schema);
        if let Some(preferred) = preferred {
            database.set_input_schema(preferred);
        }
    }

    let Some(schema) = schema else {
        return;
    };
    let spec = &schema.generator;

    if let Some(input_schema) = non_blank(spec.input_schema.as_deref()) {
        database.set_input_schema(input_schema);
    }
    let schemata = normalize(&spec.input_schemata);
    if !schemata.is_empty() {
        database.set_input_schemata(schemata);
    }
    if let Some(includes) = non_blank(spec.includes.as_deref()) {
        database.set_includes(includes);
    }
    if let Some(excludes) = non_blank(spec.excludes.as_deref()) {
        database.set_excludes(excludes);
    }

    apply_setter_map(codegen.database_mut(), &spec.database_options);
    apply_setter_map(codegen.generator_mut(), &spec.generator_options);

    let target = codegen.target_mut();
    apply_setter_map(&mut *target, &spec.target_options);
    if let Some(package) = non_blank(spec.target_package.as_deref()) {
        target.set_package_name(package);
    }
    if let Some(directory) = non_blank(spec.target_directory.as_deref()) {
        target.set_directory(directory);
    }

    tracing::debug!(configuration = %schema.name, "Applied code generator settings");
}

fn is_blank(value: Option<&str>) -> bool {
    non_blank(value).is_none()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
