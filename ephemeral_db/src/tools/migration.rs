//! Settings of the schema migration runner

use serde::{Deserialize, Serialize};

use crate::propagate::setters::DynamicSettings;
use crate::propagate::targets::MigrationTarget;

/// Migration runner settings, as handed to the runner
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, DynamicSettings)]
#[serde(default)]
pub struct MigrationSettings {
    pub url: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub locations: Vec<String>,
    pub schemas: Vec<String>,
    pub default_schema: Option<String>,
    pub table: Option<String>,
    pub baseline_on_migrate: Option<bool>,
    pub baseline_version: Option<String>,
    pub baseline_description: Option<String>,
    pub clean_disabled: Option<bool>,
    pub validate_on_migrate: Option<bool>,
    pub create_schemas: Option<bool>,
    pub out_of_order: Option<bool>,
    pub mixed: Option<bool>,
    pub connect_retries: Option<u32>,
    pub encoding: Option<String>,
    pub placeholder_prefix: Option<String>,
    pub placeholder_suffix: Option<String>,
}

impl MigrationTarget for MigrationSettings {
    fn set_url(&mut self, url: &str) {
        self.url = Some(url.to_string());
    }

    fn set_user(&mut self, user: &str) {
        self.user = Some(user.to_string());
    }

    fn set_password(&mut self, password: &str) {
        self.password = Some(password.to_string());
    }

    fn set_locations(&mut self, locations: Vec<String>) {
        self.locations = locations;
    }

    fn set_schemas(&mut self, schemas: Vec<String>) {
        self.schemas = schemas;
    }
}
