use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use indexmap::{IndexMap, IndexSet};
use serde_json::json;

use ephemeral_db::config::{self, Config};
use ephemeral_db::plan::{bare_step_name, is_generation_step, step_name_for};
use ephemeral_db::utils::init_logging;
use ephemeral_db::{BuildSession, CodegenSettings, ContainerDatabaseService};

#[derive(Parser, Debug)]
#[command(
    name = "ephemeral_db",
    version,
    about = "Throwaway database containers for migration and codegen steps"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "ephemeral_db.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show what a build with these steps would provision, without starting anything
    Plan {
        /// Requested build steps, optionally path-qualified (`:app:generateCode`)
        steps: Vec<String>,
    },
    /// Start the container, configure the tools and keep it running until Ctrl-C
    Provision {
        steps: Vec<String>,

        /// Write the configured tool settings here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Shut the container down right after writing the settings
        #[arg(long)]
        no_wait: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = config::load_from_file(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    init_logging(config.logging.as_ref())?;

    match cli.command {
        Command::Plan { steps } => plan(config, steps),
        Command::Provision {
            steps,
            output,
            no_wait,
        } => provision(config, steps, output, no_wait).await,
    }
}

/// Code generator configurations, one per schema when none are set directly
fn codegen_settings(config: &Config) -> IndexMap<String, CodegenSettings> {
    if !config.tools.codegen.is_empty() {
        return config.tools.codegen.clone();
    }
    config
        .schemas
        .keys()
        .map(|name| (name.clone(), CodegenSettings::default()))
        .collect()
}

fn plan(config: Config, steps: Vec<String>) -> anyhow::Result<()> {
    let config = Arc::new(config);
    let service = Arc::new(ContainerDatabaseService::new(&config.database));
    let session = BuildSession::new(config.clone(), service, steps);
    let codegen = codegen_settings(&config);

    let report = json!({
        "engine": config.database.engine.to_string(),
        "image": config
            .database
            .image
            .clone()
            .unwrap_or_else(|| config.database.engine.default_image().to_string()),
        "schemas": session.resolve_schema_names(&codegen),
        "active_configurations": session
            .active_configurations()
            .iter()
            .map(|c| c.name.clone())
            .collect::<Vec<_>>(),
        "generation_steps": session.generation_steps(&codegen),
        "driver_dependency": session.driver_dependency(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn provision(
    config: Config,
    steps: Vec<String>,
    output: Option<PathBuf>,
    no_wait: bool,
) -> anyhow::Result<()> {
    let config = Arc::new(config);
    let service = Arc::new(ContainerDatabaseService::new(&config.database));
    let session = BuildSession::new(config.clone(), service.clone(), steps);

    let result = async {
        let mut migration = config.tools.migration.clone();
        let mut codegen = codegen_settings(&config);
        session.prepare_migration(&mut migration, &codegen).await?;

        let mut generation_steps: Vec<String> = session
            .requested_steps()
            .iter()
            .map(|step| bare_step_name(step).to_string())
            .filter(|step| is_generation_step(step))
            .collect();
        if generation_steps.is_empty() {
            generation_steps = session.generation_steps(&codegen);
        }

        let mut configured = IndexSet::new();
        for step in &generation_steps {
            if session.prepare_generation(step, &mut codegen).await? {
                configured.insert(step.clone());
            }
        }
        let codegen_by_step: IndexMap<String, &CodegenSettings> = codegen
            .iter()
            .filter_map(|(name, settings)| {
                let step = step_name_for(name);
                configured.contains(&step).then_some((step, settings))
            })
            .collect();

        let connection = service.connection_parameters().await?;
        let schemas = service.initialized_names().await;
        let document = json!({
            "connection": {
                "url": connection.url,
                "username": connection.username,
                "password": connection.password,
            },
            "schemas": schemas,
            "driver_dependency": session.driver_dependency(),
            "migration": migration,
            "codegen": codegen_by_step,
        });
        let rendered = serde_json::to_string_pretty(&document)?;
        match &output {
            Some(path) => {
                std::fs::write(path, rendered)
                    .with_context(|| format!("writing {}", path.display()))?;
                tracing::info!(path = %path.display(), "Wrote tool settings");
            }
            None => println!("{}", rendered),
        }

        if !no_wait {
            tracing::info!("Database is up, press Ctrl-C to stop it");
            tokio::signal::ctrl_c().await?;
        }
        anyhow::Ok(())
    }
    .await;

    session.shutdown().await?;
    result
}
