//! Recipes - terminal client for the recipe and ingredient manager
//!
//! Layers, leaf first:
//! - `api`: REST client for recipes and ingredients behind the `RecipeApi` trait
//! - `forms`: editable field sets that turn back into validated payloads
//! - `controller`: the view-state machine, driven directly or as an actor
//! - `tui`: ratatui front end rendering controller snapshots

pub mod api;
pub mod cli;
pub mod config;
pub mod controller;
pub mod domain;
mod error;
pub mod forms;
pub mod tui;

pub use api::{HttpApiClient, RecipeApi};
pub use controller::{Controller, ControllerHandle, Intent, View, ViewState};
pub use domain::{Ingredient, IngredientPayload, Recipe, RecipeIngredient, RecipeLinePayload, RecipePayload};
pub use error::RecipeError;
pub use forms::{IngredientForm, LineDraft, RecipeForm};
