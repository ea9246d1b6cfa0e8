//! View-state controller
//!
//! `state` holds the pure transitions, `driver` drives them through a
//! `RecipeApi`, and `handle` runs the controller as an actor for the TUI.

mod confirm;
mod driver;
mod handle;
mod state;

pub use confirm::{AutoConfirm, Confirm, ConfirmRequest, DialogConfirm, StdinConfirm};
pub use driver::{Controller, IngredientFormTarget, Job, Landed, Nav, Outcome, Prepared, RecipeFormTarget, Refresh};
pub use handle::{ControllerHandle, Intent};
pub use state::{DetailState, DetailTicket, IngredientsState, InlineEdit, View, ViewState};
