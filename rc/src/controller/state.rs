//! View state and its pure transitions
//!
//! Nothing here touches the network. The controller feeds API results into
//! these transitions and publishes the resulting snapshot.

use tracing::{debug, warn};

use crate::domain::{Ingredient, Recipe};
use crate::error::RecipeError;
use crate::forms::{IngredientForm, RecipeForm};

/// Which screen is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    /// Initial fetch still running
    #[default]
    Loading,
    List,
    Detail {
        recipe_id: i64,
    },
    AddForm,
    Ingredients,
}

impl View {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Loading => "Loading",
            Self::List => "Recipes",
            Self::Detail { .. } => "Recipe",
            Self::AddForm => "Add recipe",
            Self::Ingredients => "Ingredients",
        }
    }
}

/// Identifies one detail fetch; only the latest ticket may land
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetailTicket {
    pub recipe_id: i64,
    pub generation: u64,
}

/// Detail screen for one recipe
#[derive(Debug, Clone, Default)]
pub struct DetailState {
    pub recipe: Option<Recipe>,
    pub loading: bool,
    /// Fetch failure; shown with a way back to the list
    pub error: Option<String>,
    /// Delete failure, shown next to the actions
    pub action_error: Option<String>,
    /// Edit sub-mode when present
    pub edit: Option<RecipeForm>,
    pub edit_error: Option<String>,
}

/// One ingredient being edited in place
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineEdit {
    pub id: i64,
    pub form: IngredientForm,
    pub error: Option<String>,
}

/// Ingredients screen: add form plus at most one inline editor
#[derive(Debug, Clone, Default)]
pub struct IngredientsState {
    pub form: IngredientForm,
    pub form_error: Option<String>,
    pub editing: Option<InlineEdit>,
    /// Delete failure, e.g. ingredient still in use
    pub error: Option<String>,
}

/// Immutable snapshot of everything the views render
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub view: View,
    pub recipes: Vec<Recipe>,
    pub ingredients: Vec<Ingredient>,
    /// Recipe opened from the list
    pub selected: Option<i64>,
    pub detail: DetailState,
    pub add_form: RecipeForm,
    pub add_error: Option<String>,
    pub ingredients_view: IngredientsState,
    /// Dismissable list-load error
    pub banner: Option<String>,
    /// A mutation request is outstanding
    pub submitting: bool,
    /// Bumped on every detail entry and exit
    pub generation: u64,
}

impl ViewState {
    /// Leave `Loading` once both startup fetches have settled
    pub fn finish_initial_load(
        &mut self,
        recipes: Result<Vec<Recipe>, RecipeError>,
        ingredients: Result<Vec<Ingredient>, RecipeError>,
    ) {
        debug!("ViewState::finish_initial_load: called");
        self.apply_recipes(recipes);
        self.apply_ingredients(ingredients);
        self.view = View::List;
    }

    /// A failed load empties the list and raises the banner
    pub fn apply_recipes(&mut self, result: Result<Vec<Recipe>, RecipeError>) {
        match result {
            Ok(recipes) => {
                debug!(count = recipes.len(), "ViewState::apply_recipes: loaded");
                self.recipes = recipes;
                self.banner = None;
            }
            Err(e) => {
                warn!(error = %e, "Failed to load recipes");
                self.recipes.clear();
                self.banner = Some(e.to_string());
            }
        }
    }

    /// A failed load degrades silently to an empty list
    pub fn apply_ingredients(&mut self, result: Result<Vec<Ingredient>, RecipeError>) {
        match result {
            Ok(ingredients) => {
                debug!(count = ingredients.len(), "ViewState::apply_ingredients: loaded");
                self.ingredients = ingredients;
            }
            Err(e) => {
                warn!(error = %e, "Failed to load ingredients");
                self.ingredients.clear();
            }
        }
    }

    /// Enter `Detail(id)` and hand out the ticket for its fetch
    pub fn open_detail(&mut self, recipe_id: i64) -> DetailTicket {
        self.generation += 1;
        debug!(recipe_id, generation = self.generation, "ViewState::open_detail: called");
        self.view = View::Detail { recipe_id };
        self.selected = Some(recipe_id);
        self.detail = DetailState {
            loading: true,
            ..DetailState::default()
        };
        DetailTicket {
            recipe_id,
            generation: self.generation,
        }
    }

    /// Land a detail fetch; returns false when the ticket is stale
    pub fn finish_detail(&mut self, ticket: DetailTicket, result: Result<Recipe, RecipeError>) -> bool {
        let current = ticket.generation == self.generation
            && self.view
                == View::Detail {
                    recipe_id: ticket.recipe_id,
                };
        if !current {
            debug!(?ticket, generation = self.generation, "ViewState::finish_detail: stale, ignored");
            return false;
        }

        self.detail.loading = false;
        match result {
            Ok(recipe) => {
                self.detail.recipe = Some(recipe);
                self.detail.error = None;
            }
            Err(e) => {
                debug!(error = %e, "ViewState::finish_detail: fetch failed");
                self.detail.error = Some(e.to_string());
            }
        }
        true
    }

    /// Switch screens; leaving `Detail` invalidates its outstanding fetch
    pub fn navigate(&mut self, view: View) {
        debug!(from = ?self.view, to = ?view, "ViewState::navigate: called");
        if matches!(self.view, View::Detail { .. }) {
            self.generation += 1;
            self.detail = DetailState::default();
        }
        match view {
            View::AddForm if self.view != View::AddForm => {
                self.add_form = RecipeForm::new();
                self.add_error = None;
            }
            View::Ingredients if self.view != View::Ingredients => {
                self.ingredients_view.editing = None;
                self.ingredients_view.form_error = None;
                self.ingredients_view.error = None;
            }
            _ => {}
        }
        self.view = view;
    }

    /// Detail edit sub-mode, pre-filled from the fetched recipe
    pub fn begin_edit(&mut self) -> bool {
        let Some(recipe) = &self.detail.recipe else {
            return false;
        };
        self.detail.edit = Some(RecipeForm::from_recipe(recipe));
        self.detail.edit_error = None;
        true
    }

    pub fn cancel_edit(&mut self) {
        self.detail.edit = None;
        self.detail.edit_error = None;
    }

    pub fn dismiss_banner(&mut self) {
        self.banner = None;
    }

    pub fn recipe(&self, id: i64) -> Option<&Recipe> {
        self.recipes.iter().find(|r| r.id == id)
    }

    pub fn ingredient(&self, id: i64) -> Option<&Ingredient> {
        self.ingredients.iter().find(|i| i.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe(id: i64, name: &str) -> Recipe {
        Recipe {
            id,
            name: name.to_string(),
            instructions: String::new(),
            created_at: None,
            ingredients: vec![],
        }
    }

    fn loaded() -> ViewState {
        let mut state = ViewState::default();
        state.finish_initial_load(Ok(vec![recipe(5, "Soup"), recipe(7, "Stew")]), Ok(vec![]));
        state
    }

    #[test]
    fn test_starts_loading_then_list() {
        let mut state = ViewState::default();
        assert_eq!(state.view, View::Loading);
        state.finish_initial_load(Ok(vec![]), Ok(vec![]));
        assert_eq!(state.view, View::List);
    }

    #[test]
    fn test_recipe_failure_raises_banner_ingredient_failure_is_silent() {
        let mut state = ViewState::default();
        state.finish_initial_load(
            Err(RecipeError::Network("connection refused".to_string())),
            Err(RecipeError::Network("connection refused".to_string())),
        );
        assert_eq!(state.view, View::List);
        assert!(state.recipes.is_empty());
        assert!(state.ingredients.is_empty());
        assert_eq!(state.banner.as_deref(), Some("Network error: connection refused"));

        state.dismiss_banner();
        assert!(state.banner.is_none());
    }

    #[test]
    fn test_later_ticket_wins() {
        let mut state = loaded();
        let t5 = state.open_detail(5);
        let t7 = state.open_detail(7);

        assert!(state.finish_detail(t7, Ok(recipe(7, "Stew"))));
        assert!(!state.finish_detail(t5, Ok(recipe(5, "Soup"))));
        assert_eq!(state.detail.recipe.as_ref().map(|r| r.id), Some(7));
        assert_eq!(state.view, View::Detail { recipe_id: 7 });
    }

    #[test]
    fn test_stale_ticket_ignored_even_if_it_lands_first() {
        let mut state = loaded();
        let t5 = state.open_detail(5);
        let t7 = state.open_detail(7);

        assert!(!state.finish_detail(t5, Ok(recipe(5, "Soup"))));
        assert!(state.detail.recipe.is_none());
        assert!(state.detail.loading);
        assert!(state.finish_detail(t7, Ok(recipe(7, "Stew"))));
    }

    #[test]
    fn test_leaving_detail_invalidates_fetch() {
        let mut state = loaded();
        let ticket = state.open_detail(5);
        state.navigate(View::List);
        assert!(!state.finish_detail(ticket, Ok(recipe(5, "Soup"))));
        assert!(state.detail.recipe.is_none());

        // Re-entering the same recipe gets a fresh ticket
        let again = state.open_detail(5);
        assert_ne!(again, ticket);
        assert!(state.finish_detail(again, Ok(recipe(5, "Soup"))));
    }

    #[test]
    fn test_detail_error_kept_for_display() {
        let mut state = loaded();
        let ticket = state.open_detail(99);
        let err = RecipeError::Request {
            status: 404,
            message: "Not found".to_string(),
        };
        assert!(state.finish_detail(ticket, Err(err)));
        assert_eq!(state.detail.error.as_deref(), Some("Not found"));
        assert!(!state.detail.loading);
    }

    #[test]
    fn test_add_form_resets_on_entry() {
        let mut state = loaded();
        state.navigate(View::AddForm);
        state.add_form.name = "Draft".to_string();
        state.add_error = Some("boom".to_string());

        // Re-selecting the same screen keeps the draft
        state.navigate(View::AddForm);
        assert_eq!(state.add_form.name, "Draft");

        state.navigate(View::List);
        state.navigate(View::AddForm);
        assert_eq!(state.add_form, RecipeForm::new());
        assert!(state.add_error.is_none());
    }

    #[test]
    fn test_begin_edit_needs_loaded_recipe() {
        let mut state = loaded();
        let ticket = state.open_detail(5);
        assert!(!state.begin_edit());
        state.finish_detail(ticket, Ok(recipe(5, "Soup")));
        assert!(state.begin_edit());
        assert_eq!(state.detail.edit.as_ref().map(|f| f.name.as_str()), Some("Soup"));
        state.cancel_edit();
        assert!(state.detail.edit.is_none());
    }
}
