//! Database connection handling
//!
//! This module opens the short-lived administrative connections used to
//! create schemas and to probe a freshly started container.

use std::time::Duration;

use sqlx::{
    mysql::{MySqlConnectOptions, MySqlPoolOptions},
    postgres::{PgConnectOptions, PgPoolOptions},
    MySql, Pool, Postgres,
};

use crate::db::engine::{EngineKind, SchemaFamily};
use crate::error::Result;

/// Where and as whom to connect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectTarget {
    pub engine: EngineKind,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
}

/// Enumeration of supported database connections
#[derive(Debug, Clone)]
pub enum DatabaseConnection {
    Postgres(Pool<Postgres>),
    MySql(Pool<MySql>),
}

impl DatabaseConnection {
    /// Open a single-connection pool against the target
    pub async fn connect(target: &ConnectTarget, timeout: Duration) -> Result<Self> {
        match target.engine.schema_family() {
            SchemaFamily::Schemas => {
                let options = PgConnectOptions::new()
                    .host(&target.host)
                    .port(target.port)
                    .username(&target.username)
                    .password(&target.password)
                    .database(&target.database);
                let pool = PgPoolOptions::new()
                    .max_connections(1)
                    .acquire_timeout(timeout)
                    .connect_with(options)
                    .await?;

                Ok(DatabaseConnection::Postgres(pool))
            }
            SchemaFamily::Databases => {
                let options = MySqlConnectOptions::new()
                    .host(&target.host)
                    .port(target.port)
                    .username(&target.username)
                    .password(&target.password)
                    .database(&target.database);
                let pool = MySqlPoolOptions::new()
                    .max_connections(1)
                    .acquire_timeout(timeout)
                    .connect_with(options)
                    .await?;

                Ok(DatabaseConnection::MySql(pool))
            }
        }
    }

    /// Execute a SQL statement
    pub async fn execute(&self, sql: &str) -> Result<()> {
        match self {
            DatabaseConnection::Postgres(pool) => {
                sqlx::query(sql).execute(pool).await?;
                Ok(())
            }
            DatabaseConnection::MySql(pool) => {
                sqlx::query(sql).execute(pool).await?;
                Ok(())
            }
        }
    }

    pub async fn close(&self) {
        match self {
            DatabaseConnection::Postgres(pool) => pool.close().await,
            DatabaseConnection::MySql(pool) => pool.close().await,
        }
    }
}
