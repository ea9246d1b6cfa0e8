//! CLI argument parsing for recipes

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "recipes")]
#[command(author, version, about = "Recipe and ingredient manager", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    /// Server root, e.g. http://127.0.0.1:5001
    #[arg(long = "api-url", global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Interactive terminal UI (default)
    Tui,

    /// List recipes, newest first
    List {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show one recipe with its ingredients
    Show {
        id: i64,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// List ingredients by name
    Ingredients {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Create an ingredient
    AddIngredient {
        name: String,

        /// Default unit, e.g. g or ml
        #[arg(short, long, default_value = "")]
        unit: String,
    },

    /// Delete a recipe
    Delete {
        id: i64,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Delete an ingredient that no recipe uses
    DeleteIngredient {
        id: i64,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Output format for listing commands
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use text or json", s)),
        }
    }
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("recipes")
        .join("logs")
        .join("recipes.log")
}

/// Text appended to `--help`
pub fn generate_after_help() -> String {
    format!(
        "Configuration:\n  .recipes.yml, then {}\n  {} overrides api.base-url\n\nLogs are written to: {}\n",
        dirs::config_dir()
            .map(|d| d.join("recipes").join("recipes.yml").display().to_string())
            .unwrap_or_else(|| "~/.config/recipes/recipes.yml".to_string()),
        crate::config::API_URL_ENV,
        get_log_path().display()
    )
}
