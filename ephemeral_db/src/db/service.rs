//! Container-backed database provisioning service
//!
//! One service instance exists per build. It starts the database container on
//! the first request, creates every further logical schema exactly once and
//! serializes all of that behind a single lock.

use async_trait::async_trait;
use indexmap::IndexSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::config::DatabaseConfig;
use crate::db::connection::{ConnectTarget, DatabaseConnection};
use crate::db::container::{ContainerRequest, ContainerRuntime, DockerCli, RunningContainer};
use crate::db::engine::EngineKind;
use crate::error::{Error, Result};
use crate::plan::names::{normalize, DEFAULT_SCHEMA_NAME};

/// What the service needs to know to start and address its container
#[derive(Debug, Clone)]
pub struct ProvisioningSettings {
    pub engine: EngineKind,
    pub image: Option<String>,
    pub username: String,
    pub password: String,
    pub default_names: Vec<String>,
    pub connect_timeout: Duration,
}

impl ProvisioningSettings {
    pub fn from_config(config: &DatabaseConfig) -> Self {
        Self {
            engine: config.engine,
            image: config.image.clone().filter(|image| !image.trim().is_empty()),
            username: config.username.clone(),
            password: config.password.clone(),
            default_names: config.names.clone(),
            connect_timeout: Duration::from_secs(config.startup_timeout_seconds),
        }
    }

    pub fn image(&self) -> &str {
        self.image.as_deref().unwrap_or_else(|| self.engine.default_image())
    }
}

/// Live endpoint of the provisioned database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParameters {
    pub url: String,
    pub username: String,
    pub password: String,
}

/// An open administrative session
#[async_trait]
pub trait AdminSession: Send {
    async fn execute(&mut self, sql: &str) -> Result<()>;

    async fn close(self: Box<Self>);
}

/// Opens administrative sessions against a running container
#[async_trait]
pub trait AdminConnector: Send + Sync {
    async fn open(&self, target: &ConnectTarget) -> Result<Box<dyn AdminSession>>;
}

/// Administrative sessions over sqlx
#[derive(Debug, Clone)]
pub struct SqlxConnector {
    timeout: Duration,
}

impl SqlxConnector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

struct SqlxSession {
    connection: DatabaseConnection,
}

#[async_trait]
impl AdminSession for SqlxSession {
    async fn execute(&mut self, sql: &str) -> Result<()> {
        self.connection.execute(sql).await
    }

    async fn close(self: Box<Self>) {
        self.connection.close().await;
    }
}

#[async_trait]
impl AdminConnector for SqlxConnector {
    async fn open(&self, target: &ConnectTarget) -> Result<Box<dyn AdminSession>> {
        let connection = DatabaseConnection::connect(target, self.timeout).await?;
        Ok(Box::new(SqlxSession { connection }))
    }
}

/// Mutable part of the service, always accessed under the lock
#[derive(Default)]
struct ContainerHandle {
    container: Option<RunningContainer>,
    initialized: IndexSet<String>,
}

/// The shared provisioning service
pub struct ContainerDatabaseService {
    settings: ProvisioningSettings,
    runtime: Arc<dyn ContainerRuntime>,
    connector: Arc<dyn AdminConnector>,
    handle: Mutex<ContainerHandle>,
}

impl ContainerDatabaseService {
    /// Service backed by the docker CLI and sqlx
    pub fn new(config: &DatabaseConfig) -> Self {
        let settings = ProvisioningSettings::from_config(config);
        let runtime = DockerCli::new(config.host.clone(), settings.connect_timeout);
        let connector = SqlxConnector::new(settings.connect_timeout);
        Self::with_backends(settings, Arc::new(runtime), Arc::new(connector))
    }

    pub fn with_backends(
        settings: ProvisioningSettings,
        runtime: Arc<dyn ContainerRuntime>,
        connector: Arc<dyn AdminConnector>,
    ) -> Self {
        Self {
            settings,
            runtime,
            connector,
            handle: Mutex::new(ContainerHandle::default()),
        }
    }

    pub fn driver_id(&self) -> &'static str {
        self.settings.engine.driver_id()
    }

    pub fn introspection_tool_id(&self) -> &'static str {
        self.settings.engine.introspection_tool_id()
    }

    /// Make sure the container runs and every requested name exists
    ///
    /// The first name of the first call becomes the container's primary
    /// database. Later calls only create names not seen before.
    pub async fn ensure<S: AsRef<str>>(&self, requested: &[S]) -> Result<()> {
        let desired = self.desired_names(requested);
        let mut handle = self.handle.lock().await;

        let container = self.start_if_needed(&mut handle, &desired[0]).await?;
        let missing: Vec<String> = desired
            .into_iter()
            .filter(|name| !handle.initialized.contains(name))
            .collect();
        if missing.is_empty() {
            return Ok(());
        }

        let created = self
            .create_missing(&container, &missing, &mut handle.initialized)
            .await;
        tracing::debug!(names = ?handle.initialized, "Initialized database names");
        created
    }

    /// Connection parameters of the running container
    ///
    /// Starts the container with the default names when none runs yet. A
    /// running container is returned as is; no names are created.
    pub async fn connection_parameters(&self) -> Result<ConnectionParameters> {
        let mut handle = self.handle.lock().await;
        let container = match handle.container.clone() {
            Some(container) => container,
            None => {
                let defaults = self.desired_names::<&str>(&[]);
                let container = self.start_if_needed(&mut handle, &defaults[0]).await?;
                let missing: Vec<String> = defaults.into_iter().skip(1).collect();
                if !missing.is_empty() {
                    self.create_missing(&container, &missing, &mut handle.initialized)
                        .await?;
                }
                container
            }
        };

        Ok(ConnectionParameters {
            url: container.connection_url(),
            username: self.settings.username.clone(),
            password: self.settings.password.clone(),
        })
    }

    /// Names created so far, in creation order
    pub async fn initialized_names(&self) -> Vec<String> {
        self.handle.lock().await.initialized.iter().cloned().collect()
    }

    pub async fn is_running(&self) -> bool {
        self.handle.lock().await.container.is_some()
    }

    /// Stop the container if one runs and forget all state
    pub async fn shutdown(&self) -> Result<()> {
        let mut handle = self.handle.lock().await;
        let Some(container) = handle.container.take() else {
            return Ok(());
        };
        handle.initialized.clear();

        self.runtime.stop(&container).await
    }

    /// Start the container unless one runs, recording `primary` as created
    async fn start_if_needed(
        &self,
        handle: &mut ContainerHandle,
        primary: &str,
    ) -> Result<RunningContainer> {
        if let Some(container) = &handle.container {
            return Ok(container.clone());
        }

        let request = ContainerRequest {
            engine: self.settings.engine,
            image: self.settings.image().to_string(),
            username: self.settings.username.clone(),
            password: self.settings.password.clone(),
            primary_database: primary.to_string(),
        };
        let container = self.runtime.start(&request).await.map_err(|e| {
            Error::ProvisioningError(format!(
                "failed to start {} container: {}",
                request.engine, e
            ))
        })?;

        handle.container = Some(container.clone());
        handle.initialized.insert(request.primary_database);
        Ok(container)
    }

    fn desired_names<S: AsRef<str>>(&self, requested: &[S]) -> Vec<String> {
        let mut desired = normalize(requested);
        if desired.is_empty() {
            desired = normalize(&self.settings.default_names);
        }
        if desired.is_empty() {
            desired.push(DEFAULT_SCHEMA_NAME.to_string());
        }
        desired
    }

    async fn create_missing(
        &self,
        container: &RunningContainer,
        names: &[String],
        initialized: &mut IndexSet<String>,
    ) -> Result<()> {
        let engine = self.settings.engine;
        let target = ConnectTarget {
            engine,
            host: container.host.clone(),
            port: container.port,
            database: container.primary_database.clone(),
            username: engine.admin_username(&self.settings.username).to_string(),
            password: self.settings.password.clone(),
        };
        let mut session = self.connector.open(&target).await.map_err(|e| {
            Error::ProvisioningError(format!("failed to open administrative connection: {}", e))
        })?;

        for name in names {
            for statement in engine.create_statements(name, &self.settings.username) {
                if let Err(e) = session.execute(&statement).await {
                    session.close().await;
                    return Err(Error::ProvisioningError(format!(
                        "failed to create database/schema '{}': {}",
                        name, e
                    )));
                }
            }
            tracing::info!(name = %name, engine = %engine, "Created database/schema");
            initialized.insert(name.clone());
        }

        session.close().await;
        Ok(())
    }
}
