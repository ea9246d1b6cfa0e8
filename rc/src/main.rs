//! Recipes - terminal client for the recipe and ingredient manager

use std::fs;
use std::sync::Arc;

use clap::{CommandFactory, FromArgMatches};
use colored::*;
use eyre::{Context, Result};
use tracing::{debug, info};

use recipes::cli::{Cli, Command, OutputFormat, generate_after_help, get_log_path};
use recipes::config::Config;
use recipes::controller::{AutoConfirm, Confirm, StdinConfirm};
use recipes::{HttpApiClient, IngredientForm, Recipe, RecipeApi, tui};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Priority: CLI --log-level > config file > INFO
    let level = match cli_log_level.or(config_log_level).map(|s| s.to_uppercase()).as_deref() {
        Some("TRACE") => tracing::Level::TRACE,
        Some("DEBUG") => tracing::Level::DEBUG,
        Some("WARN") | Some("WARNING") => tracing::Level::WARN,
        Some("ERROR") => tracing::Level::ERROR,
        Some("INFO") | None => tracing::Level::INFO,
        Some(other) => {
            eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", other);
            tracing::Level::INFO
        }
    };

    // The TUI owns the terminal, so logs go to a file
    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = Cli::command().after_help(generate_after_help());
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref())
        .context("Failed to load configuration")?
        .with_api_url(cli.api_url.as_deref());
    info!(base_url = %config.api.base_url, "Recipes loaded config");

    let api: Arc<dyn RecipeApi> = Arc::new(HttpApiClient::from_config(&config.api)?);

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        None | Some(Command::Tui) => tui::run(api).await,
        Some(Command::List { format }) => cmd_list(api.as_ref(), format).await,
        Some(Command::Show { id, format }) => cmd_show(api.as_ref(), id, format).await,
        Some(Command::Ingredients { format }) => cmd_ingredients(api.as_ref(), format).await,
        Some(Command::AddIngredient { name, unit }) => cmd_add_ingredient(api.as_ref(), name, unit).await,
        Some(Command::Delete { id, yes }) => cmd_delete(api.as_ref(), id, confirmer(yes)).await,
        Some(Command::DeleteIngredient { id, yes }) => cmd_delete_ingredient(api.as_ref(), id, confirmer(yes)).await,
    }
}

fn confirmer(yes: bool) -> Box<dyn Confirm> {
    if yes {
        Box::new(AutoConfirm(true))
    } else {
        Box::new(StdinConfirm)
    }
}

async fn cmd_list(api: &dyn RecipeApi, format: OutputFormat) -> Result<()> {
    let recipes = api.list_recipes().await?;
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&recipes)?);
        return Ok(());
    }

    if recipes.is_empty() {
        println!("No recipes yet.");
        return Ok(());
    }
    for recipe in &recipes {
        println!(
            "{:>5}  {}  {}",
            recipe.id.to_string().dimmed(),
            recipe.name.bold(),
            format!("{} ingredient(s)", recipe.ingredient_count()).dimmed()
        );
    }
    Ok(())
}

async fn cmd_show(api: &dyn RecipeApi, id: i64, format: OutputFormat) -> Result<()> {
    let recipe = api.get_recipe(id).await?;
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&recipe)?);
        return Ok(());
    }
    print_recipe(&recipe);
    Ok(())
}

fn print_recipe(recipe: &Recipe) {
    println!("{}", recipe.name.bold().cyan());
    if let Some(created) = recipe.created_at {
        println!("{}", format!("Created {}", created.format("%Y-%m-%d %H:%M")).dimmed());
    }
    println!();
    println!("{}", "Ingredients".bold());
    if recipe.ingredients.is_empty() {
        println!("  No ingredients.");
    }
    for item in &recipe.ingredients {
        println!(
            "  • {} {} {}",
            item.quantity,
            item.effective_unit().unwrap_or("—"),
            item.ingredient_name
        );
    }
    if !recipe.instructions.is_empty() {
        println!();
        println!("{}", "Instructions".bold());
        println!("{}", recipe.instructions);
    }
}

async fn cmd_ingredients(api: &dyn RecipeApi, format: OutputFormat) -> Result<()> {
    let ingredients = api.list_ingredients().await?;
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&ingredients)?);
        return Ok(());
    }

    if ingredients.is_empty() {
        println!("No ingredients yet.");
        return Ok(());
    }
    for ingredient in &ingredients {
        println!(
            "{:>5}  {:<30} {}",
            ingredient.id.to_string().dimmed(),
            ingredient.name,
            ingredient.unit.as_deref().unwrap_or("—").dimmed()
        );
    }
    Ok(())
}

async fn cmd_add_ingredient(api: &dyn RecipeApi, name: String, unit: String) -> Result<()> {
    let payload = IngredientForm { name, unit }.to_payload()?;
    let ingredient = api.create_ingredient(&payload).await?;
    println!(
        "{} Created ingredient {} {}",
        "✓".green(),
        ingredient.label().cyan(),
        format!("(id {})", ingredient.id).dimmed()
    );
    Ok(())
}

async fn cmd_delete(api: &dyn RecipeApi, id: i64, confirm: Box<dyn Confirm>) -> Result<()> {
    let recipe = api.get_recipe(id).await?;
    println!("{}", recipe.name.bold());
    if !confirm.confirm("Delete this recipe?").await {
        println!("Cancelled");
        return Ok(());
    }
    api.delete_recipe(id).await?;
    println!("{} Deleted recipe {}", "✓".green(), recipe.name.cyan());
    Ok(())
}

async fn cmd_delete_ingredient(api: &dyn RecipeApi, id: i64, confirm: Box<dyn Confirm>) -> Result<()> {
    let ingredient = api.get_ingredient(id).await?;
    let message = format!("Delete ingredient \"{}\"?", ingredient.name);
    if !confirm.confirm(&message).await {
        println!("Cancelled");
        return Ok(());
    }
    api.delete_ingredient(id).await?;
    println!("{} Deleted ingredient {}", "✓".green(), ingredient.name.cyan());
    Ok(())
}
