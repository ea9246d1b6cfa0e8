//! CLI argument parsing for recipestore

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "recipestore")]
#[command(author, version, about = "SQLite-backed REST store for recipes and ingredients", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the REST API (default)
    Serve {
        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// SQLite database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Show row counts for the database
    Stats {
        /// SQLite database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },
}
