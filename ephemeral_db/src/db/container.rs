//! Container control plane
//!
//! The provisioning service only needs to start one database container and to
//! stop it again. `DockerCli` does that through the `docker` command line.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::{sleep, Instant};
use uuid::Uuid;

use crate::db::connection::{ConnectTarget, DatabaseConnection};
use crate::db::engine::EngineKind;
use crate::error::{Error, Result};

/// Label put on every container this crate starts
pub const SESSION_LABEL: &str = "ephemeral_db.session";

const DOCKER: &str = "docker";

/// Everything needed to start a database container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRequest {
    pub engine: EngineKind,
    pub image: String,
    pub username: String,
    pub password: String,
    /// Database the image creates on first start
    pub primary_database: String,
}

/// A started, reachable database container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunningContainer {
    pub id: String,
    pub engine: EngineKind,
    pub host: String,
    pub port: u16,
    pub primary_database: String,
}

impl RunningContainer {
    /// Connection URL clients use, without credentials
    pub fn connection_url(&self) -> String {
        self.engine.connection_url(&self.host, self.port, &self.primary_database)
    }
}

/// Minimal lifecycle contract of a container runtime
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Start a container and return once it accepts connections
    async fn start(&self, request: &ContainerRequest) -> Result<RunningContainer>;

    /// Stop and remove a container
    async fn stop(&self, container: &RunningContainer) -> Result<()>;
}

/// Container runtime backed by the `docker` CLI
#[derive(Debug, Clone)]
pub struct DockerCli {
    host: String,
    startup_timeout: Duration,
    session: Uuid,
}

impl DockerCli {
    pub fn new(host: impl Into<String>, startup_timeout: Duration) -> Self {
        Self {
            host: host.into(),
            startup_timeout,
            session: Uuid::new_v4(),
        }
    }

    async fn docker(&self, args: &[String]) -> Result<String> {
        let output = Command::new(DOCKER)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| Error::ContainerError(format!("failed to run {}: {}", DOCKER, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::ContainerError(format!(
                "{} {} failed ({}): {}",
                DOCKER,
                args.first().map(String::as_str).unwrap_or_default(),
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn run_args(&self, request: &ContainerRequest) -> Vec<String> {
        let mut args = vec![
            "run".to_string(),
            "--detach".to_string(),
            "--rm".to_string(),
            "--label".to_string(),
            format!("{}={}", SESSION_LABEL, self.session),
            "--publish".to_string(),
            format!("{}::{}", self.host, request.engine.container_port()),
        ];
        for (key, value) in request
            .engine
            .container_env(&request.username, &request.password, &request.primary_database)
        {
            args.push("--env".to_string());
            args.push(format!("{}={}", key, value));
        }
        args.push(request.image.clone());
        args
    }

    async fn published_port(&self, id: &str, engine: EngineKind) -> Result<u16> {
        let output = self
            .docker(&[
                "port".to_string(),
                id.to_string(),
                format!("{}/tcp", engine.container_port()),
            ])
            .await?;

        parse_published_port(&output).ok_or_else(|| {
            Error::ContainerError(format!(
                "could not read published port of container {}: {:?}",
                id, output
            ))
        })
    }

    /// Retry a connection until the server answers or the timeout passes
    async fn wait_until_ready(
        &self,
        container: &RunningContainer,
        request: &ContainerRequest,
    ) -> Result<()> {
        let target = ConnectTarget {
            engine: request.engine,
            host: container.host.clone(),
            port: container.port,
            database: request.primary_database.clone(),
            username: request.username.clone(),
            password: request.password.clone(),
        };
        let deadline = Instant::now() + self.startup_timeout;
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            match DatabaseConnection::connect(&target, Duration::from_secs(5)).await {
                Ok(connection) => {
                    connection.close().await;
                    tracing::debug!(
                        container = %container.id,
                        attempts,
                        "Database container is ready"
                    );
                    return Ok(());
                }
                Err(e) if Instant::now() < deadline => {
                    tracing::trace!(
                        container = %container.id,
                        attempts,
                        error = %e,
                        "Database not ready yet"
                    );
                    sleep(Duration::from_millis(500)).await;
                }
                Err(e) => {
                    return Err(Error::ContainerError(format!(
                        "container {} did not accept connections within {:?}: {}",
                        container.id, self.startup_timeout, e
                    )));
                }
            }
        }
    }
}

#[async_trait]
impl ContainerRuntime for DockerCli {
    async fn start(&self, request: &ContainerRequest) -> Result<RunningContainer> {
        let id = self.docker(&self.run_args(request)).await?;
        tracing::info!(
            container = %id,
            image = %request.image,
            engine = %request.engine,
            "Started database container"
        );

        let container = match self.published_port(&id, request.engine).await {
            Ok(port) => RunningContainer {
                id,
                engine: request.engine,
                host: self.host.clone(),
                port,
                primary_database: request.primary_database.clone(),
            },
            Err(e) => {
                let _ = self.docker(&["rm".to_string(), "--force".to_string(), id]).await;
                return Err(e);
            }
        };

        if let Err(e) = self.wait_until_ready(&container, request).await {
            let _ = self.stop(&container).await;
            return Err(e);
        }

        Ok(container)
    }

    async fn stop(&self, container: &RunningContainer) -> Result<()> {
        self.docker(&["rm".to_string(), "--force".to_string(), container.id.clone()])
            .await?;
        tracing::info!(container = %container.id, "Stopped database container");
        Ok(())
    }
}

/// Read the host port from `docker port` output such as `0.0.0.0:49153`
fn parse_published_port(output: &str) -> Option<u16> {
    output
        .lines()
        .filter_map(|line| line.trim().rsplit(':').next())
        .find_map(|port| port.trim().parse().ok())
}
