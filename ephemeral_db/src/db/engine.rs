//! Supported database engines
//!
//! Each engine carries the identifiers the downstream tools need (wire driver,
//! introspection database class, driver dependency) plus what it takes to run
//! it in a container and to create a logical schema inside it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// How an engine models several logical schemas in one server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaFamily {
    /// Schemas inside the single primary database (`CREATE SCHEMA`)
    Schemas,
    /// Separate databases next to the primary one (`CREATE DATABASE`)
    Databases,
}

/// Enumeration of supported database engines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    #[default]
    #[serde(alias = "MARIADB")]
    MariaDb,
    #[serde(alias = "MYSQL")]
    MySql,
    #[serde(alias = "POSTGRES", alias = "postgresql")]
    Postgres,
}

impl EngineKind {
    /// Wire driver identifier handed to the tools' connection settings
    pub fn driver_id(&self) -> &'static str {
        match self {
            EngineKind::MariaDb => "org.mariadb.jdbc.Driver",
            EngineKind::MySql => "com.mysql.cj.jdbc.Driver",
            EngineKind::Postgres => "org.postgresql.Driver",
        }
    }

    /// Database class the code generator introspects with
    pub fn introspection_tool_id(&self) -> &'static str {
        match self {
            EngineKind::MariaDb => "org.jooq.meta.mariadb.MariaDBDatabase",
            EngineKind::MySql => "org.jooq.meta.mysql.MySQLDatabase",
            EngineKind::Postgres => "org.jooq.meta.postgres.PostgresDatabase",
        }
    }

    pub fn default_image(&self) -> &'static str {
        match self {
            EngineKind::MariaDb => "mariadb:11.4",
            EngineKind::MySql => "mysql:8.4",
            EngineKind::Postgres => "postgres:17",
        }
    }

    /// Driver dependency coordinate the code generator needs on its classpath
    pub fn default_driver_dependency(&self) -> &'static str {
        match self {
            EngineKind::MariaDb => "org.mariadb.jdbc:mariadb-java-client:3.5.1",
            EngineKind::MySql => "com.mysql:mysql-connector-j:9.3.0",
            EngineKind::Postgres => "org.postgresql:postgresql:42.7.5",
        }
    }

    pub fn schema_family(&self) -> SchemaFamily {
        match self {
            EngineKind::Postgres => SchemaFamily::Schemas,
            EngineKind::MariaDb | EngineKind::MySql => SchemaFamily::Databases,
        }
    }

    /// Port the server listens on inside the container
    pub fn container_port(&self) -> u16 {
        match self {
            EngineKind::Postgres => 5432,
            EngineKind::MariaDb | EngineKind::MySql => 3306,
        }
    }

    pub fn url_scheme(&self) -> &'static str {
        match self {
            EngineKind::MariaDb => "mariadb",
            EngineKind::MySql => "mysql",
            EngineKind::Postgres => "postgresql",
        }
    }

    /// Connection URL for an endpoint, without credentials
    pub fn connection_url(&self, host: &str, port: u16, database: &str) -> String {
        format!("{}://{}:{}/{}", self.url_scheme(), host, port, database)
    }

    /// Environment the official image reads on first start
    pub fn container_env(
        &self,
        username: &str,
        password: &str,
        database: &str,
    ) -> Vec<(String, String)> {
        let pairs: Vec<(&str, &str)> = match self {
            EngineKind::Postgres => vec![
                ("POSTGRES_DB", database),
                ("POSTGRES_USER", username),
                ("POSTGRES_PASSWORD", password),
            ],
            EngineKind::MySql => {
                let mut pairs = vec![
                    ("MYSQL_DATABASE", database),
                    ("MYSQL_ROOT_PASSWORD", password),
                ];
                if !is_root(username) {
                    pairs.push(("MYSQL_USER", username));
                    pairs.push(("MYSQL_PASSWORD", password));
                }
                pairs
            }
            EngineKind::MariaDb => {
                let mut pairs = vec![
                    ("MARIADB_DATABASE", database),
                    ("MARIADB_ROOT_PASSWORD", password),
                ];
                if !is_root(username) {
                    pairs.push(("MARIADB_USER", username));
                    pairs.push(("MARIADB_PASSWORD", password));
                }
                pairs
            }
        };

        pairs
            .into_iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    /// User the administrative connection authenticates as
    ///
    /// The MySQL family only lets root create databases; the container is
    /// started with the root password equal to the configured password.
    pub fn admin_username<'a>(&self, username: &'a str) -> &'a str {
        match self.schema_family() {
            SchemaFamily::Schemas => username,
            SchemaFamily::Databases => "root",
        }
    }

    /// Quote an identifier, doubling embedded quote characters
    pub fn quote_identifier(&self, name: &str) -> String {
        match self.schema_family() {
            SchemaFamily::Schemas => format!("\"{}\"", name.replace('"', "\"\"")),
            SchemaFamily::Databases => format!("`{}`", name.replace('`', "``")),
        }
    }

    /// Statements that create a logical schema if it is missing
    pub fn create_statements(&self, name: &str, username: &str) -> Vec<String> {
        let quoted = self.quote_identifier(name);
        match self.schema_family() {
            SchemaFamily::Schemas => vec![format!("CREATE SCHEMA IF NOT EXISTS {}", quoted)],
            SchemaFamily::Databases => {
                let mut statements = vec![format!("CREATE DATABASE IF NOT EXISTS {}", quoted)];
                if !is_root(username) {
                    statements.push(format!(
                        "GRANT ALL PRIVILEGES ON {}.* TO '{}'@'%'",
                        quoted,
                        username.replace('\'', "''")
                    ));
                }
                statements
            }
        }
    }
}

fn is_root(username: &str) -> bool {
    username.eq_ignore_ascii_case("root")
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EngineKind::MariaDb => "mariadb",
            EngineKind::MySql => "mysql",
            EngineKind::Postgres => "postgres",
        };
        f.write_str(name)
    }
}

impl FromStr for EngineKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mariadb" => Ok(EngineKind::MariaDb),
            "mysql" => Ok(EngineKind::MySql),
            "postgres" | "postgresql" => Ok(EngineKind::Postgres),
            other => Err(Error::ConfigError(format!("Unsupported database engine: {}", other))),
        }
    }
}
