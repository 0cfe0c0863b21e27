//! Per-invocation orchestration
//!
//! A host creates one `ContainerDatabaseService` per build and one
//! `BuildSession` per invocation, then calls `prepare_migration` before the
//! migration step and `prepare_generation` before each generation step.

use std::sync::Arc;

use crate::config::{Config, SchemaConfiguration};
use crate::db::service::ContainerDatabaseService;
use crate::error::Result;
use crate::plan::names::{normalize, ResolvedSchemaSet};
use crate::plan::resolver::resolve_schema_names;
use crate::plan::selector::{
    bare_step_name, find_configuration_for_step, select_active_configurations, step_name_for,
};
use crate::propagate::engine::{configure_codegen, configure_migration, GenerationContext};
use crate::propagate::targets::{CodegenRegistry, MigrationTarget};

/// One build invocation against the shared provisioning service
pub struct BuildSession {
    config: Arc<Config>,
    service: Arc<ContainerDatabaseService>,
    requested_steps: Vec<String>,
}

impl BuildSession {
    pub fn new(
        config: Arc<Config>,
        service: Arc<ContainerDatabaseService>,
        requested_steps: Vec<String>,
    ) -> Self {
        Self {
            config,
            service,
            requested_steps,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn service(&self) -> &Arc<ContainerDatabaseService> {
        &self.service
    }

    pub fn requested_steps(&self) -> &[String] {
        &self.requested_steps
    }

    /// Every schema name this invocation needs provisioned
    pub fn resolve_schema_names<R>(&self, codegen: &R) -> ResolvedSchemaSet
    where
        R: CodegenRegistry + ?Sized,
    {
        resolve_schema_names(
            &self.config.database.names,
            &self.config.schema_configurations(),
            codegen,
        )
    }

    /// Configurations the migration step works on in this invocation
    pub fn active_configurations(&self) -> Vec<&SchemaConfiguration> {
        select_active_configurations(&self.requested_steps, &self.config.schema_configurations())
    }

    /// Generation step names of the code generator's configurations
    pub fn generation_steps<R>(&self, codegen: &R) -> Vec<String>
    where
        R: CodegenRegistry + ?Sized,
    {
        codegen
            .configuration_names()
            .iter()
            .map(|name| step_name_for(name))
            .collect()
    }

    /// Driver dependency the code generator needs
    pub fn driver_dependency(&self) -> String {
        self.config.driver_dependency()
    }

    /// Provision every needed schema and configure the migration runner
    pub async fn prepare_migration<M, R>(&self, migration: &mut M, codegen: &R) -> Result<()>
    where
        M: MigrationTarget + ?Sized,
        R: CodegenRegistry + ?Sized,
    {
        let resolved = self.resolve_schema_names(codegen);
        self.service.ensure(resolved.as_slice()).await?;
        let connection = self.service.connection_parameters().await?;

        let selected = self.active_configurations();
        tracing::info!(
            configurations = ?selected.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            url = %connection.url,
            "Configuring migration step"
        );
        configure_migration(migration, &connection, &selected);
        Ok(())
    }

    /// Provision every needed schema and configure one generation step
    ///
    /// Returns false when the code generator has no configuration for the
    /// step; the schemas are provisioned either way.
    pub async fn prepare_generation<R>(&self, step: &str, codegen: &mut R) -> Result<bool>
    where
        R: CodegenRegistry + ?Sized,
    {
        let step = bare_step_name(step);
        let resolved = self.resolve_schema_names(&*codegen);
        self.service.ensure(resolved.as_slice()).await?;

        let Some(name) = codegen
            .configuration_names()
            .into_iter()
            .find(|name| step_name_for(name) == step)
        else {
            tracing::debug!(step = %step, "No code generator configuration for step");
            return Ok(false);
        };
        let Some(settings) = codegen.settings_mut(&name) else {
            return Ok(false);
        };

        let connection = self.service.connection_parameters().await?;
        let configurations = self.config.schema_configurations();
        let schema = find_configuration_for_step(step, &configurations);
        let global_names = normalize(&self.config.database.names);
        let context = GenerationContext {
            connection: &connection,
            driver_id: self.service.driver_id(),
            introspection_tool_id: self.service.introspection_tool_id(),
            default_schema: global_names.first().map(String::as_str),
        };

        tracing::info!(
            step = %step,
            configuration = schema.map(|s| s.name.as_str()).unwrap_or("<defaults>"),
            "Configuring generation step"
        );
        configure_codegen(settings, &context, schema);
        Ok(true)
    }

    /// Stop the shared container
    pub async fn shutdown(&self) -> Result<()> {
        self.service.shutdown().await
    }
}
