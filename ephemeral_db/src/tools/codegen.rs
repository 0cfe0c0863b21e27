//! Settings of the schema-introspecting code generator

use serde::{Deserialize, Serialize};

use crate::propagate::setters::DynamicSettings;
use crate::propagate::targets::{CodegenTarget, ConnectionTarget, DatabaseTarget, OutputTarget};

/// One code generator configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodegenSettings {
    pub jdbc: JdbcSection,
    pub generator: GeneratorSection,
}

/// Connection the generator introspects through
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JdbcSection {
    pub url: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub driver: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, DynamicSettings)]
#[serde(default)]
pub struct GeneratorSection {
    pub name: Option<String>,
    pub strategy: Option<String>,
    pub records: Option<bool>,
    pub pojos: Option<bool>,
    pub immutable_pojos: Option<bool>,
    pub daos: Option<bool>,
    pub fluent_setters: Option<bool>,
    pub java_time_types: Option<bool>,
    pub database: DatabaseSection,
    pub target: TargetSection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, DynamicSettings)]
#[serde(default)]
pub struct DatabaseSection {
    pub name: Option<String>,
    pub input_schema: Option<String>,
    pub input_schemata: Vec<String>,
    pub includes: Option<String>,
    pub excludes: Option<String>,
    pub include_routines: Option<bool>,
    pub include_sequences: Option<bool>,
    pub include_indexes: Option<bool>,
    pub record_version_fields: Option<String>,
    pub record_timestamp_fields: Option<String>,
    pub output_schema_to_default: Option<bool>,
    pub schema_version_provider: Option<String>,
    pub force_integer_types_on_zero_scale_decimals: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, DynamicSettings)]
#[serde(default)]
pub struct TargetSection {
    pub package_name: Option<String>,
    pub directory: Option<String>,
    pub encoding: Option<String>,
    pub clean: Option<bool>,
}

impl ConnectionTarget for JdbcSection {
    fn set_url(&mut self, url: &str) {
        self.url = Some(url.to_string());
    }

    fn set_user(&mut self, user: &str) {
        self.user = Some(user.to_string());
    }

    fn set_password(&mut self, password: &str) {
        self.password = Some(password.to_string());
    }

    fn set_driver(&mut self, driver: &str) {
        self.driver = Some(driver.to_string());
    }
}

impl DatabaseTarget for DatabaseSection {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn input_schema(&self) -> Option<&str> {
        self.input_schema.as_deref()
    }

    fn input_schemata(&self) -> &[String] {
        &self.input_schemata
    }

    fn set_name(&mut self, name: &str) {
        self.name = Some(name.to_string());
    }

    fn set_input_schema(&mut self, schema: &str) {
        self.input_schema = Some(schema.to_string());
    }

    fn set_input_schemata(&mut self, schemata: Vec<String>) {
        self.input_schemata = schemata;
    }

    fn set_includes(&mut self, includes: &str) {
        self.includes = Some(includes.to_string());
    }

    fn set_excludes(&mut self, excludes: &str) {
        self.excludes = Some(excludes.to_string());
    }
}

impl OutputTarget for TargetSection {
    fn set_package_name(&mut self, package: &str) {
        self.package_name = Some(package.to_string());
    }

    fn set_directory(&mut self, directory: &str) {
        self.directory = Some(directory.to_string());
    }
}

impl CodegenTarget for CodegenSettings {
    fn jdbc_mut(&mut self) -> &mut dyn ConnectionTarget {
        &mut self.jdbc
    }

    fn database(&self) -> &dyn DatabaseTarget {
        &self.generator.database
    }

    fn database_mut(&mut self) -> &mut dyn DatabaseTarget {
        &mut self.generator.database
    }

    fn generator_mut(&mut self) -> &mut dyn DynamicSettings {
        &mut self.generator
    }

    fn target_mut(&mut self) -> &mut dyn OutputTarget {
        &mut self.generator.target
    }
}
