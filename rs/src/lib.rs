//! RecipeStore - persistence collaborator for the recipe manager
//!
//! Owns the relational store (SQLite via rusqlite) and exposes it through the
//! REST contract consumed by the `recipes` client.
//!
//! # Architecture
//!
//! ```text
//! recipes.db
//! ├── ingredients          # id, name (unique), unit
//! ├── recipes              # id, name, instructions, created_at
//! └── recipe_ingredients   # recipe_id, ingredient_id, quantity, unit_override
//! ```
//!
//! # Example
//!
//! ```ignore
//! use recipestore::{IngredientInput, RecipeStore};
//!
//! let mut store = RecipeStore::open("recipes.db")?;
//! let flour = store.create_ingredient(&IngredientInput::new("Flour", "g"))?;
//! ```

pub mod cli;
pub mod config;
mod error;
mod model;
pub mod server;
mod store;

pub use error::StoreError;
pub use model::{
    Ingredient, IngredientInput, LineInput, Recipe, RecipeInput, RecipeLine, MAX_INGREDIENT_NAME, MAX_INSTRUCTIONS,
    MAX_LINES, MAX_QUANTITY, MAX_RECIPE_NAME, MAX_UNIT,
};
pub use server::{router, serve};
pub use store::{RecipeStore, StoreStats};

/// Default port the REST server listens on
pub const DEFAULT_PORT: u16 = 5001;

/// Base path all routes are mounted under
pub const API_BASE: &str = "/api";
