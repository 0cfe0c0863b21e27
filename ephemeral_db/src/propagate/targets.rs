//! Typed capability interfaces of the downstream tools' settings
//!
//! These are the only parts of a foreign settings object the propagation
//! engine knows statically. Everything else goes through `DynamicSettings`.

use indexmap::IndexMap;

use crate::propagate::setters::DynamicSettings;

/// Settings of the schema migration runner
pub trait MigrationTarget: DynamicSettings {
    fn set_url(&mut self, url: &str);
    fn set_user(&mut self, user: &str);
    fn set_password(&mut self, password: &str);
    fn set_locations(&mut self, locations: Vec<String>);
    fn set_schemas(&mut self, schemas: Vec<String>);
}

/// Connection section of the code generator settings
pub trait ConnectionTarget {
    fn set_url(&mut self, url: &str);
    fn set_user(&mut self, user: &str);
    fn set_password(&mut self, password: &str);
    fn set_driver(&mut self, driver: &str);
}

/// Database (introspection) section of the code generator settings
pub trait DatabaseTarget: DynamicSettings {
    fn name(&self) -> Option<&str>;
    fn input_schema(&self) -> Option<&str>;
    fn input_schemata(&self) -> &[String];

    fn set_name(&mut self, name: &str);
    fn set_input_schema(&mut self, schema: &str);
    fn set_input_schemata(&mut self, schemata: Vec<String>);
    fn set_includes(&mut self, includes: &str);
    fn set_excludes(&mut self, excludes: &str);
}

/// Output section of the code generator settings
pub trait OutputTarget: DynamicSettings {
    fn set_package_name(&mut self, package: &str);
    fn set_directory(&mut self, directory: &str);
}

/// One code generator configuration
pub trait CodegenTarget {
    fn jdbc_mut(&mut self) -> &mut dyn ConnectionTarget;
    fn database(&self) -> &dyn DatabaseTarget;
    fn database_mut(&mut self) -> &mut dyn DatabaseTarget;
    /// Generator-level settings, only reachable through free-form options
    fn generator_mut(&mut self) -> &mut dyn DynamicSettings;
    fn target_mut(&mut self) -> &mut dyn OutputTarget;
}

/// The code generator's named collection of configurations
pub trait CodegenRegistry {
    type Settings: CodegenTarget;

    /// Configuration names in declaration order
    fn configuration_names(&self) -> Vec<String>;
    fn settings(&self, name: &str) -> Option<&Self::Settings>;
    fn settings_mut(&mut self, name: &str) -> Option<&mut Self::Settings>;
}

impl<C: CodegenTarget> CodegenRegistry for IndexMap<String, C> {
    type Settings = C;

    fn configuration_names(&self) -> Vec<String> {
        self.keys().cloned().collect()
    }

    fn settings(&self, name: &str) -> Option<&C> {
        self.get(name)
    }

    fn settings_mut(&mut self, name: &str) -> Option<&mut C> {
        self.get_mut(name)
    }
}
