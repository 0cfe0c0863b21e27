//! Tests for ephemeral_db
//!
//! In-memory container and connection fakes, plus end-to-end scenarios that
//! run a whole build invocation against them.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::db::connection::ConnectTarget;
use crate::db::container::{ContainerRequest, ContainerRuntime, RunningContainer};
use crate::db::engine::EngineKind;
use crate::db::service::{
    AdminConnector, AdminSession, ContainerDatabaseService, ProvisioningSettings,
};
use crate::error::{Error, Result};

/// Everything the fakes saw
#[derive(Debug, Default)]
pub(crate) struct Recorder {
    pub starts: Vec<ContainerRequest>,
    pub stops: Vec<String>,
    pub admin_targets: Vec<ConnectTarget>,
    pub statements: Vec<String>,
    pub closed_sessions: usize,
}

pub(crate) type SharedRecorder = Arc<Mutex<Recorder>>;

pub(crate) struct FakeRuntime {
    recorder: SharedRecorder,
    fail_start: bool,
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn start(&self, request: &ContainerRequest) -> Result<RunningContainer> {
        let mut recorder = self.recorder.lock().unwrap();
        if self.fail_start {
            return Err(Error::ContainerError("image pull failed".to_string()));
        }
        recorder.starts.push(request.clone());
        let n = recorder.starts.len();
        Ok(RunningContainer {
            id: format!("fake-{}", n),
            engine: request.engine,
            host: "127.0.0.1".to_string(),
            port: 40000 + n as u16,
            primary_database: request.primary_database.clone(),
        })
    }

    async fn stop(&self, container: &RunningContainer) -> Result<()> {
        self.recorder.lock().unwrap().stops.push(container.id.clone());
        Ok(())
    }
}

pub(crate) struct FakeConnector {
    recorder: SharedRecorder,
    fail_on: Option<String>,
}

struct FakeSession {
    recorder: SharedRecorder,
    fail_on: Option<String>,
}

#[async_trait]
impl AdminSession for FakeSession {
    async fn execute(&mut self, sql: &str) -> Result<()> {
        if let Some(needle) = &self.fail_on {
            if sql.contains(needle.as_str()) {
                return Err(Error::DatabaseError(format!("permission denied: {}", sql)));
            }
        }
        self.recorder.lock().unwrap().statements.push(sql.to_string());
        Ok(())
    }

    async fn close(self: Box<Self>) {
        self.recorder.lock().unwrap().closed_sessions += 1;
    }
}

#[async_trait]
impl AdminConnector for FakeConnector {
    async fn open(&self, target: &ConnectTarget) -> Result<Box<dyn AdminSession>> {
        self.recorder.lock().unwrap().admin_targets.push(target.clone());
        Ok(Box::new(FakeSession {
            recorder: self.recorder.clone(),
            fail_on: self.fail_on.clone(),
        }))
    }
}

/// Builder for a service wired to the fakes
pub(crate) struct FakeService {
    pub engine: EngineKind,
    pub default_names: Vec<String>,
    pub fail_start: bool,
    pub fail_on: Option<String>,
}

impl FakeService {
    pub fn new(engine: EngineKind) -> Self {
        Self {
            engine,
            default_names: Vec::new(),
            fail_start: false,
            fail_on: None,
        }
    }

    pub fn build(self) -> (Arc<ContainerDatabaseService>, SharedRecorder) {
        let recorder = SharedRecorder::default();
        let settings = ProvisioningSettings {
            engine: self.engine,
            image: None,
            username: "app".to_string(),
            password: "secret".to_string(),
            default_names: self.default_names,
            connect_timeout: Duration::from_secs(1),
        };
        let runtime = FakeRuntime {
            recorder: recorder.clone(),
            fail_start: self.fail_start,
        };
        let connector = FakeConnector {
            recorder: recorder.clone(),
            fail_on: self.fail_on,
        };
        let service = ContainerDatabaseService::with_backends(
            settings,
            Arc::new(runtime),
            Arc::new(connector),
        );
        (Arc::new(service), recorder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    use crate::config::{self, Config, SchemaConfiguration};
    use crate::session::BuildSession;
    use crate::tools::{CodegenSettings, MigrationSettings};

    fn session(
        config: Config,
        service: Arc<ContainerDatabaseService>,
        steps: &[&str],
    ) -> BuildSession {
        BuildSession::new(
            Arc::new(config),
            service,
            steps.iter().map(|s| s.to_string()).collect(),
        )
    }

    fn postgres_billing_config() -> Config {
        let mut config = Config::default();
        config.database.engine = EngineKind::Postgres;
        let mut billing = SchemaConfiguration::new("billing");
        billing.input_schema = Some("billing".to_string());
        billing.migration.locations = vec!["db/a".to_string(), "db/b".to_string()];
        config.add_schema(billing);
        config
    }

    #[tokio::test]
    async fn test_postgres_billing_scenario() {
        let (service, recorder) = FakeService::new(EngineKind::Postgres).build();
        let session = session(postgres_billing_config(), service.clone(), &["generateBillingCode"]);

        let mut migration = MigrationSettings::default();
        let mut codegen: IndexMap<String, CodegenSettings> = IndexMap::new();
        codegen.insert("billing".to_string(), CodegenSettings::default());

        session.prepare_migration(&mut migration, &codegen).await.unwrap();
        assert!(session.prepare_generation("generateBillingCode", &mut codegen).await.unwrap());

        {
            let recorder = recorder.lock().unwrap();
            assert_eq!(recorder.starts.len(), 1);
            assert_eq!(recorder.starts[0].primary_database, "billing");
            assert_eq!(recorder.starts[0].image, "postgres:17");
            assert!(recorder.statements.is_empty());
        }

        assert_eq!(migration.schemas, vec!["billing"]);
        assert_eq!(migration.locations, vec!["db/a", "db/b"]);
        assert_eq!(migration.url.as_deref(), Some("postgresql://127.0.0.1:40001/billing"));
        assert_eq!(migration.user.as_deref(), Some("app"));
        assert_eq!(migration.password.as_deref(), Some("secret"));

        let billing = &codegen["billing"];
        assert_eq!(billing.generator.database.input_schema.as_deref(), Some("billing"));
        assert_eq!(
            billing.generator.database.name.as_deref(),
            Some("org.jooq.meta.postgres.PostgresDatabase")
        );
        assert_eq!(billing.jdbc.driver.as_deref(), Some("org.postgresql.Driver"));
        assert_eq!(billing.jdbc.url, migration.url);
    }

    #[tokio::test]
    async fn test_postgres_schema_created_inside_default_database() {
        let (service, recorder) = FakeService::new(EngineKind::Postgres).build();
        let mut config = postgres_billing_config();
        config.database.names = vec!["app".to_string()];
        let session = session(config, service, &[]);

        let mut migration = MigrationSettings::default();
        let codegen: IndexMap<String, CodegenSettings> = IndexMap::new();
        session.prepare_migration(&mut migration, &codegen).await.unwrap();

        let recorder = recorder.lock().unwrap();
        assert_eq!(recorder.starts[0].primary_database, "app");
        assert_eq!(recorder.statements, vec!["CREATE SCHEMA IF NOT EXISTS \"billing\""]);
        assert_eq!(recorder.admin_targets[0].database, "app");
        assert_eq!(recorder.admin_targets[0].username, "app");
    }

    #[tokio::test]
    async fn test_scoped_invocation_provisions_globally() {
        let mut config = Config::default();
        config.database.engine = EngineKind::MariaDb;
        for name in ["a", "b"] {
            let mut schema = SchemaConfiguration::new(name);
            schema.input_schema = Some(name.to_string());
            schema.migration.locations = vec![format!("db/{}", name)];
            schema
                .migration
                .options
                .insert("table".to_string(), format!("history_{}", name));
            config.add_schema(schema);
        }

        let (service, recorder) = FakeService::new(EngineKind::MariaDb).build();
        let session = session(config, service.clone(), &[":generateACode"]);

        let mut migration = MigrationSettings::default();
        let codegen: IndexMap<String, CodegenSettings> = IndexMap::new();
        session.prepare_migration(&mut migration, &codegen).await.unwrap();

        assert_eq!(service.initialized_names().await, vec!["a", "b"]);
        assert_eq!(
            recorder.lock().unwrap().statements,
            vec![
                "CREATE DATABASE IF NOT EXISTS `b`",
                "GRANT ALL PRIVILEGES ON `b`.* TO 'app'@'%'",
            ]
        );
        assert_eq!(recorder.lock().unwrap().admin_targets[0].username, "root");

        assert_eq!(migration.locations, vec!["db/a"]);
        assert_eq!(migration.schemas, vec!["a"]);
        assert_eq!(migration.table.as_deref(), Some("history_a"));
    }

    #[tokio::test]
    async fn test_unscoped_invocation_configures_every_schema() {
        let mut config = Config::default();
        for name in ["a", "b"] {
            let mut schema = SchemaConfiguration::new(name);
            schema.migration.locations = vec![format!("db/{}", name), "db/shared".to_string()];
            schema.generator.input_schema = Some(name.to_string());
            config.add_schema(schema);
        }

        let (service, _recorder) = FakeService::new(EngineKind::MySql).build();
        let session = session(config, service, &["build"]);

        let mut migration = MigrationSettings::default();
        migration.locations = vec!["db/stale".to_string()];
        session
            .prepare_migration(&mut migration, &IndexMap::<String, CodegenSettings>::new())
            .await
            .unwrap();

        assert_eq!(migration.locations, vec!["db/a", "db/shared", "db/b"]);
        assert_eq!(migration.schemas, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_generation_defaults_without_schema_configuration() {
        let mut config = Config::default();
        config.database.names = vec!["core".to_string(), "extra".to_string()];
        let (service, _recorder) = FakeService::new(EngineKind::MySql).build();
        let session = session(config, service, &[]);

        let mut codegen: IndexMap<String, CodegenSettings> = IndexMap::new();
        codegen.insert("main".to_string(), CodegenSettings::default());
        let mut named = CodegenSettings::default();
        named.generator.database.name = Some("com.example.CustomDatabase".to_string());
        named.generator.database.input_schemata = vec!["legacy".to_string()];
        codegen.insert("legacy".to_string(), named);

        assert!(session.prepare_generation("generateCode", &mut codegen).await.unwrap());
        assert!(session.prepare_generation(":generateLegacyCode", &mut codegen).await.unwrap());

        let main = &codegen["main"].generator.database;
        assert_eq!(main.input_schema.as_deref(), Some("core"));
        assert_eq!(main.name.as_deref(), Some("org.jooq.meta.mysql.MySQLDatabase"));

        let legacy = &codegen["legacy"].generator.database;
        assert_eq!(legacy.name.as_deref(), Some("com.example.CustomDatabase"));
        assert_eq!(legacy.input_schema, None);
        assert_eq!(legacy.input_schemata, vec!["legacy"]);
    }

    #[tokio::test]
    async fn test_generation_never_borrows_another_configurations_schema() {
        let mut config = Config::default();
        let mut a = SchemaConfiguration::new("a");
        a.input_schema = Some("a".to_string());
        config.add_schema(a);
        config.add_schema(SchemaConfiguration::new("b"));

        let (service, _recorder) = FakeService::new(EngineKind::MariaDb).build();
        let session = session(config, service.clone(), &["generateBCode"]);
        let mut codegen: IndexMap<String, CodegenSettings> = IndexMap::new();
        codegen.insert("a".to_string(), CodegenSettings::default());
        codegen.insert("b".to_string(), CodegenSettings::default());

        assert!(session.prepare_generation("generateBCode", &mut codegen).await.unwrap());
        assert!(session.prepare_generation("generateACode", &mut codegen).await.unwrap());

        assert_eq!(codegen["b"].generator.database.input_schema, None);
        assert_eq!(codegen["a"].generator.database.input_schema.as_deref(), Some("a"));
        assert_eq!(service.initialized_names().await, vec!["a"]);
    }

    #[tokio::test]
    async fn test_generation_overrides_apply_in_order() {
        let mut config = Config::default();
        config.database.engine = EngineKind::Postgres;
        let mut reporting = SchemaConfiguration::new("reporting");
        reporting.input_schema = Some("reports".to_string());
        reporting.generator.input_schemata = vec![" reports ".to_string(), "shared".to_string()];
        reporting.generator.includes = Some("report_.*".to_string());
        reporting.generator.excludes = Some("tmp_.*".to_string());
        reporting.generator.target_package = Some("com.example.reports".to_string());
        reporting.generator.target_directory = Some("build/generated".to_string());
        reporting
            .generator
            .database_options
            .insert("includeRoutines".to_string(), "false".to_string());
        reporting
            .generator
            .database_options
            .insert("noSuchOption".to_string(), "x".to_string());
        reporting
            .generator
            .generator_options
            .insert("pojos".to_string(), "true".to_string());
        reporting
            .generator
            .target_options
            .insert("packageName".to_string(), "com.example.ignored".to_string());
        reporting
            .generator
            .target_options
            .insert("clean".to_string(), "TRUE".to_string());
        config.add_schema(reporting);

        let (service, recorder) = FakeService::new(EngineKind::Postgres).build();
        let session = session(config, service, &["generateReportingCode"]);
        let mut codegen: IndexMap<String, CodegenSettings> = IndexMap::new();
        codegen.insert("reporting".to_string(), CodegenSettings::default());

        assert!(session.prepare_generation("generateReportingCode", &mut codegen).await.unwrap());

        let generator = &codegen["reporting"].generator;
        assert_eq!(generator.database.input_schema.as_deref(), Some("reports"));
        assert_eq!(generator.database.input_schemata, vec!["reports", "shared"]);
        assert_eq!(generator.database.includes.as_deref(), Some("report_.*"));
        assert_eq!(generator.database.excludes.as_deref(), Some("tmp_.*"));
        assert_eq!(generator.database.include_routines, Some(false));
        assert_eq!(generator.pojos, Some(true));
        assert_eq!(generator.target.clean, Some(true));
        assert_eq!(generator.target.package_name.as_deref(), Some("com.example.reports"));
        assert_eq!(generator.target.directory.as_deref(), Some("build/generated"));

        let recorder = recorder.lock().unwrap();
        assert_eq!(recorder.starts[0].primary_database, "reports");
        assert_eq!(recorder.statements, vec!["CREATE SCHEMA IF NOT EXISTS \"shared\""]);
    }

    #[tokio::test]
    async fn test_step_without_generator_settings_still_provisions() {
        let (service, recorder) = FakeService::new(EngineKind::Postgres).build();
        let session = session(postgres_billing_config(), service.clone(), &[]);
        let mut codegen: IndexMap<String, CodegenSettings> = IndexMap::new();

        assert!(!session.prepare_generation("generateBillingCode", &mut codegen).await.unwrap());
        assert!(service.is_running().await);
        assert_eq!(recorder.lock().unwrap().starts.len(), 1);
    }

    #[tokio::test]
    async fn test_generated_schemas_are_always_provisioned() {
        let mut config = Config::default();
        config.database.engine = EngineKind::Postgres;
        let mut billing = SchemaConfiguration::new("billing");
        billing.input_schema = Some("billing".to_string());
        billing.generator.input_schema = Some("billing_view".to_string());
        config.add_schema(billing);

        let (service, _recorder) = FakeService::new(EngineKind::Postgres).build();
        let session = session(config, service.clone(), &[]);
        let mut codegen: IndexMap<String, CodegenSettings> = IndexMap::new();
        codegen.insert("billing".to_string(), CodegenSettings::default());

        session.prepare_generation("generateBillingCode", &mut codegen).await.unwrap();

        let provisioned = service.initialized_names().await;
        let database = &codegen["billing"].generator.database;
        let targeted = database.input_schema.iter().chain(database.input_schemata.iter());
        for schema in targeted {
            assert!(provisioned.contains(schema), "{} was not provisioned", schema);
        }
    }

    #[tokio::test]
    async fn test_session_shutdown_without_provisioning() {
        let (service, recorder) = FakeService::new(EngineKind::MariaDb).build();
        let session = session(Config::default(), service, &[]);

        session.shutdown().await.unwrap();
        session.shutdown().await.unwrap();
        assert!(recorder.lock().unwrap().stops.is_empty());
    }

    #[test]
    fn test_config_file_round_trip_into_session() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
            [database]
            engine = "postgres"
            names = ["app"]

            [schemas.main]
            input_schema = "public"

            [schemas.reporting.generator]
            input_schemata = ["reports", "audit"]

            [tools.codegen.main.generator.database]
            input_schema = "public"
            "#
        )
        .unwrap();

        let config = config::load_from_file(file.path()).unwrap();
        let (service, _recorder) = FakeService::new(EngineKind::Postgres).build();
        let session = session(config, service, &[]);

        let resolved = session.resolve_schema_names(&session.config().tools.codegen);
        assert_eq!(resolved.as_slice(), &["app", "public", "reports", "audit"]);
        assert_eq!(session.generation_steps(&session.config().tools.codegen), vec!["generateCode"]);
        assert_eq!(session.driver_dependency(), "org.postgresql:postgresql:42.7.5");
    }
}
