mod config;
mod plan_cmd;
mod serve_cmd;
#[cfg(test)]
mod test_util;

use clap::{Parser, Subcommand};

use config::{CliOverrides, ConfigFile, PlannerConfig};

#[derive(Parser)]
#[command(name = "planner", about = "Turn a goal into a task plan with an LLM")]
struct Cli {
    /// Model name (overrides PLANNER_MODEL env var and config file)
    #[arg(long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server (POST /plan)
    Serve {
        /// Address to bind (overrides PLANNER_BIND env var)
        #[arg(long)]
        bind: Option<String>,
        /// Port to listen on (overrides PORT env var)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Generate a single plan and print it
    Plan {
        /// What the plan should achieve
        goal: String,
        /// "today", or anything else for this week
        #[arg(long, default_value = "week")]
        horizon: String,
        /// Print the raw JSON instead of a task list
        #[arg(long)]
        json: bool,
    },
    /// Print the task-plan JSON schema sent to the model
    Schema,
    /// Write a planner config file with default settings
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
        /// Store this API key in the config file (otherwise OPENAI_API_KEY is used)
        #[arg(long)]
        api_key: Option<String>,
    },
}

/// Execute the `planner init` command: write config file.
fn cmd_init(force: bool, api_key: Option<String>) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let has_key = api_key.is_some();
    let path = config::save_config(&ConfigFile::with_defaults(api_key))?;

    println!("Config written to {}", path.display());
    println!("  server.port = {}", config::DEFAULT_PORT);
    println!("  openai.model = {}", planner_core::llm::OpenAiConfig::DEFAULT_MODEL);
    if has_key {
        println!("  openai.api_key = <set>");
    } else {
        println!();
        println!("Next: export OPENAI_API_KEY, then run `planner serve`.");
    }

    Ok(())
}

/// Execute the `planner schema` command.
fn cmd_schema() -> anyhow::Result<()> {
    let schema = planner_core::plan::task_plan_schema();
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loaded before the subscriber so RUST_LOG may come from .env.
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match dotenv {
        Err(e) if !e.not_found() => tracing::warn!(error = %e, "failed to load .env file"),
        _ => {}
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { bind, port } => {
            let overrides = CliOverrides {
                bind,
                port,
                model: cli.model,
            };
            let resolved = PlannerConfig::resolve(&overrides)?;
            serve_cmd::run_serve(resolved).await?;
        }
        Commands::Plan {
            goal,
            horizon,
            json,
        } => {
            let overrides = CliOverrides {
                model: cli.model,
                ..Default::default()
            };
            let resolved = PlannerConfig::resolve(&overrides)?;
            plan_cmd::run_plan(resolved, &goal, &horizon, json).await?;
        }
        Commands::Schema => {
            cmd_schema()?;
        }
        Commands::Init { force, api_key } => {
            cmd_init(force, api_key)?;
        }
    }

    Ok(())
}
