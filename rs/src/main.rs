//! RecipeStore - REST persistence for the recipe manager

use std::path::PathBuf;

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use tokio::net::TcpListener;
use tracing::{debug, info};

use recipestore::RecipeStore;
use recipestore::cli::{Cli, Command};
use recipestore::config::Config;

fn parse_level(level: Option<&str>) -> tracing::Level {
    match level.map(|s| s.to_uppercase()).as_deref() {
        Some("TRACE") => tracing::Level::TRACE,
        Some("DEBUG") => tracing::Level::DEBUG,
        Some("WARN") | Some("WARNING") => tracing::Level::WARN,
        Some("ERROR") => tracing::Level::ERROR,
        Some("INFO") | None => tracing::Level::INFO,
        Some(other) => {
            eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", other);
            tracing::Level::INFO
        }
    }
}

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Priority: CLI --log-level > config file > INFO
    let level = parse_level(cli_log_level.or(config_log_level));

    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .try_init()
        .map_err(|e| eyre::eyre!("Failed to install subscriber: {}", e))?;

    debug!(?level, "Logging initialized");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        None => cmd_serve(&config, None, None, None).await,
        Some(Command::Serve { host, port, database }) => cmd_serve(&config, host, port, database).await,
        Some(Command::Stats { database }) => cmd_stats(&config, database),
    }
}

async fn cmd_serve(config: &Config, host: Option<String>, port: Option<u16>, database: Option<PathBuf>) -> Result<()> {
    let host = host.unwrap_or_else(|| config.host.clone());
    let port = port.unwrap_or(config.port);
    let database = database.unwrap_or_else(|| config.database.clone());

    let store = RecipeStore::open(&database)
        .with_context(|| format!("Failed to open database {}", database.display()))?;
    info!(database = %database.display(), "Opened store");

    let listener = TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", host, port))?;

    println!(
        "{} Serving on {} (database: {})",
        "✓".green(),
        format!("http://{}:{}/api", host, port).cyan(),
        database.display()
    );
    recipestore::serve(listener, store).await
}

fn cmd_stats(config: &Config, database: Option<PathBuf>) -> Result<()> {
    let database = database.unwrap_or_else(|| config.database.clone());
    let store = RecipeStore::open(&database)
        .with_context(|| format!("Failed to open database {}", database.display()))?;
    let stats = store.stats()?;

    println!("Database: {}", database.display().to_string().cyan());
    println!("  Ingredients: {}", stats.ingredients);
    println!("  Recipes: {}", stats.recipes);
    println!("  Recipe lines: {}", stats.lines);
    Ok(())
}
