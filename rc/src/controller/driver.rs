//! Controller - owns the view state and drives it through the API
//!
//! Every mutation is split in three steps so the same logic serves both the
//! direct async methods and the actor:
//! - `prepare_*` validates, asks for confirmation, sets `submitting` and
//!   returns a `Job`
//! - `Job::run` performs the single request
//! - `land` lands the `Outcome` and names the list to re-fetch; `apply`
//!   also waits for that fetch

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::confirm::Confirm;
use super::state::{DetailTicket, InlineEdit, View, ViewState};
use crate::api::RecipeApi;
use crate::domain::{Ingredient, IngredientPayload, Recipe, RecipePayload};
use crate::error::RecipeError;
use crate::forms::{FieldEdit, IngredientField, IngredientForm, RecipeField, RecipeForm};

/// Header navigation, available from every screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nav {
    Recipes,
    AddRecipe,
    Ingredients,
}

/// Which recipe form an edit is aimed at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeFormTarget {
    /// The add-recipe screen
    Add,
    /// The detail screen's edit sub-mode
    Edit,
}

/// Which ingredient form an edit is aimed at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngredientFormTarget {
    New,
    Inline,
}

/// A validated mutation ready to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    CreateRecipe(RecipePayload),
    UpdateRecipe { id: i64, payload: RecipePayload },
    DeleteRecipe(i64),
    CreateIngredient(IngredientPayload),
    UpdateIngredient { id: i64, payload: IngredientPayload },
    DeleteIngredient(i64),
}

/// Result of a finished `Job`
#[derive(Debug)]
pub enum Outcome {
    RecipeCreated(Result<Recipe, RecipeError>),
    RecipeUpdated {
        id: i64,
        result: Result<Recipe, RecipeError>,
    },
    RecipeDeleted {
        id: i64,
        result: Result<(), RecipeError>,
    },
    IngredientCreated(Result<Ingredient, RecipeError>),
    IngredientUpdated {
        id: i64,
        result: Result<Ingredient, RecipeError>,
    },
    IngredientDeleted {
        id: i64,
        result: Result<(), RecipeError>,
    },
}

impl Job {
    pub async fn run(self, api: &dyn RecipeApi) -> Outcome {
        debug!(job = ?self, "Job::run: called");
        match self {
            Job::CreateRecipe(payload) => Outcome::RecipeCreated(api.create_recipe(&payload).await),
            Job::UpdateRecipe { id, payload } => Outcome::RecipeUpdated {
                id,
                result: api.update_recipe(id, &payload).await,
            },
            Job::DeleteRecipe(id) => Outcome::RecipeDeleted {
                id,
                result: api.delete_recipe(id).await,
            },
            Job::CreateIngredient(payload) => Outcome::IngredientCreated(api.create_ingredient(&payload).await),
            Job::UpdateIngredient { id, payload } => Outcome::IngredientUpdated {
                id,
                result: api.update_ingredient(id, &payload).await,
            },
            Job::DeleteIngredient(id) => Outcome::IngredientDeleted {
                id,
                result: api.delete_ingredient(id).await,
            },
        }
    }
}

/// Prepared mutation: `Ok(None)` when there is nothing to do
pub type Prepared = Result<Option<Job>, RecipeError>;

/// A list made stale by a landed mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    Recipes,
    Ingredients,
}

/// What `Controller::land` did with an outcome
#[derive(Debug)]
pub struct Landed {
    pub result: Result<(), RecipeError>,
    pub refresh: Option<Refresh>,
}

/// The view-state controller
pub struct Controller {
    api: Arc<dyn RecipeApi>,
    confirm: Arc<dyn Confirm>,
    state: ViewState,
    publisher: Option<watch::Sender<ViewState>>,
}

impl Controller {
    pub fn new(api: Arc<dyn RecipeApi>, confirm: Arc<dyn Confirm>) -> Self {
        debug!("Controller::new: called");
        Self {
            api,
            confirm,
            state: ViewState::default(),
            publisher: None,
        }
    }

    /// Publish a snapshot on every change
    pub fn with_publisher(mut self, tx: watch::Sender<ViewState>) -> Self {
        tx.send_replace(self.state.clone());
        self.publisher = Some(tx);
        self
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn api(&self) -> Arc<dyn RecipeApi> {
        Arc::clone(&self.api)
    }

    fn publish(&self) {
        if let Some(tx) = &self.publisher {
            tx.send_replace(self.state.clone());
        }
    }

    // === Loading ===

    /// Fetch recipes and ingredients concurrently, then show the list
    pub async fn start(&mut self) {
        debug!("Controller::start: called");
        let (recipes, ingredients) = tokio::join!(self.api.list_recipes(), self.api.list_ingredients());
        self.state.finish_initial_load(recipes, ingredients);
        info!(
            recipes = self.state.recipes.len(),
            ingredients = self.state.ingredients.len(),
            "Initial load complete"
        );
        self.publish();
    }

    pub async fn reload_recipes(&mut self) {
        let result = self.api.list_recipes().await;
        self.finish_recipes(result);
    }

    pub async fn reload_ingredients(&mut self) {
        let result = self.api.list_ingredients().await;
        self.finish_ingredients(result);
    }

    /// Land a recipe list fetched elsewhere
    pub fn finish_recipes(&mut self, result: Result<Vec<Recipe>, RecipeError>) {
        self.state.apply_recipes(result);
        self.publish();
    }

    pub fn finish_ingredients(&mut self, result: Result<Vec<Ingredient>, RecipeError>) {
        self.state.apply_ingredients(result);
        self.publish();
    }

    pub async fn reload(&mut self) {
        let (recipes, ingredients) = tokio::join!(self.api.list_recipes(), self.api.list_ingredients());
        self.state.apply_recipes(recipes);
        self.state.apply_ingredients(ingredients);
        self.publish();
    }

    // === Navigation ===

    pub fn show(&mut self, nav: Nav) {
        if self.state.view == View::Loading {
            debug!(?nav, "Controller::show: still loading, ignored");
            return;
        }
        let view = match nav {
            Nav::Recipes => View::List,
            Nav::AddRecipe => View::AddForm,
            Nav::Ingredients => View::Ingredients,
        };
        self.state.navigate(view);
        self.publish();
    }

    /// Detail back to the list
    pub fn back(&mut self) {
        if matches!(self.state.view, View::Detail { .. }) {
            self.state.navigate(View::List);
            self.publish();
        }
    }

    /// Enter `Detail(id)`; the caller fetches and lands the ticket
    pub fn begin_detail(&mut self, recipe_id: i64) -> DetailTicket {
        let ticket = self.state.open_detail(recipe_id);
        self.publish();
        ticket
    }

    pub fn finish_detail(&mut self, ticket: DetailTicket, result: Result<Recipe, RecipeError>) -> bool {
        let landed = self.state.finish_detail(ticket, result);
        if landed {
            self.publish();
        }
        landed
    }

    /// Select a recipe and wait for its detail fetch
    pub async fn select_recipe(&mut self, recipe_id: i64) -> bool {
        let ticket = self.begin_detail(recipe_id);
        let result = self.api.get_recipe(recipe_id).await;
        self.finish_detail(ticket, result)
    }

    pub fn dismiss_banner(&mut self) {
        self.state.dismiss_banner();
        self.publish();
    }

    // === Form editing ===

    pub fn begin_edit(&mut self) -> bool {
        let started = matches!(self.state.view, View::Detail { .. }) && self.state.begin_edit();
        if started {
            self.publish();
        }
        started
    }

    pub fn cancel_edit(&mut self) {
        self.state.cancel_edit();
        self.publish();
    }

    fn recipe_form_mut(&mut self, target: RecipeFormTarget) -> Option<&mut RecipeForm> {
        match (target, self.state.view) {
            (RecipeFormTarget::Add, View::AddForm) => Some(&mut self.state.add_form),
            (RecipeFormTarget::Edit, View::Detail { .. }) => self.state.detail.edit.as_mut(),
            _ => None,
        }
    }

    pub fn edit_recipe_field(&mut self, target: RecipeFormTarget, field: RecipeField, edit: FieldEdit) -> bool {
        let changed = self
            .recipe_form_mut(target)
            .is_some_and(|form| form.apply(field, edit));
        if changed {
            self.publish();
        }
        changed
    }

    pub fn add_line(&mut self, target: RecipeFormTarget) {
        if let Some(form) = self.recipe_form_mut(target) {
            form.add_line();
            self.publish();
        }
    }

    pub fn remove_line(&mut self, target: RecipeFormTarget, idx: usize) -> bool {
        let removed = self
            .recipe_form_mut(target)
            .is_some_and(|form| form.remove_line(idx));
        if removed {
            self.publish();
        }
        removed
    }

    fn ingredient_form_mut(&mut self, target: IngredientFormTarget) -> Option<&mut IngredientForm> {
        if self.state.view != View::Ingredients {
            return None;
        }
        let view = &mut self.state.ingredients_view;
        match target {
            IngredientFormTarget::New => Some(&mut view.form),
            IngredientFormTarget::Inline => view.editing.as_mut().map(|e| &mut e.form),
        }
    }

    pub fn edit_ingredient_field(
        &mut self,
        target: IngredientFormTarget,
        field: IngredientField,
        edit: FieldEdit,
    ) -> bool {
        let changed = self
            .ingredient_form_mut(target)
            .is_some_and(|form| form.apply(field, edit));
        if changed {
            self.publish();
        }
        changed
    }

    /// Open the inline editor; replaces any other open editor
    pub fn begin_ingredient_edit(&mut self, id: i64) -> bool {
        if self.state.view != View::Ingredients {
            return false;
        }
        let Some(ingredient) = self.state.ingredient(id) else {
            return false;
        };
        let form = IngredientForm::from_ingredient(ingredient);
        self.state.ingredients_view.editing = Some(InlineEdit { id, form, error: None });
        self.state.ingredients_view.error = None;
        self.publish();
        true
    }

    pub fn cancel_ingredient_edit(&mut self) {
        self.state.ingredients_view.editing = None;
        self.publish();
    }

    // === Mutations: prepare ===

    fn guard(&self) -> Result<(), RecipeError> {
        if self.state.submitting {
            debug!("Controller::guard: request already in flight");
            return Err(RecipeError::InFlight);
        }
        Ok(())
    }

    fn begin_submit(&mut self, job: Job) -> Prepared {
        self.state.submitting = true;
        self.publish();
        Ok(Some(job))
    }

    /// Validate the add form or the detail edit form
    pub fn prepare_submit_recipe(&mut self, target: RecipeFormTarget) -> Prepared {
        debug!(?target, "Controller::prepare_submit_recipe: called");
        self.guard()?;

        let Some(form) = self.recipe_form_mut(target) else {
            return Ok(None);
        };
        let payload = form.to_payload();
        let slot = match target {
            RecipeFormTarget::Add => &mut self.state.add_error,
            RecipeFormTarget::Edit => &mut self.state.detail.edit_error,
        };
        let payload = match payload {
            Ok(payload) => {
                *slot = None;
                payload
            }
            Err(e) => {
                *slot = Some(e.to_string());
                self.publish();
                return Err(e);
            }
        };

        let job = match (target, self.state.view) {
            (RecipeFormTarget::Edit, View::Detail { recipe_id }) => Job::UpdateRecipe {
                id: recipe_id,
                payload,
            },
            _ => Job::CreateRecipe(payload),
        };
        self.begin_submit(job)
    }

    pub fn prepare_create_ingredient(&mut self) -> Prepared {
        debug!("Controller::prepare_create_ingredient: called");
        self.guard()?;
        if self.state.view != View::Ingredients {
            return Ok(None);
        }

        let view = &mut self.state.ingredients_view;
        match view.form.to_payload() {
            Ok(payload) => {
                view.form_error = None;
                self.begin_submit(Job::CreateIngredient(payload))
            }
            Err(e) => {
                view.form_error = Some(e.to_string());
                self.publish();
                Err(e)
            }
        }
    }

    pub fn prepare_save_ingredient(&mut self) -> Prepared {
        debug!("Controller::prepare_save_ingredient: called");
        self.guard()?;
        if self.state.view != View::Ingredients {
            return Ok(None);
        }

        let Some(edit) = self.state.ingredients_view.editing.as_mut() else {
            return Ok(None);
        };
        match edit.form.to_payload() {
            Ok(payload) => {
                edit.error = None;
                let id = edit.id;
                self.begin_submit(Job::UpdateIngredient { id, payload })
            }
            Err(e) => {
                edit.error = Some(e.to_string());
                self.publish();
                Err(e)
            }
        }
    }

    /// Confirm, then prepare deletion of the recipe on screen
    pub async fn prepare_delete_recipe(&mut self) -> Prepared {
        let View::Detail { recipe_id } = self.state.view else {
            return Ok(None);
        };
        debug!(recipe_id, "Controller::prepare_delete_recipe: called");
        self.guard()?;

        if !self.confirm.confirm("Delete this recipe?").await {
            debug!(recipe_id, "Controller::prepare_delete_recipe: declined");
            return Ok(None);
        }
        self.state.detail.action_error = None;
        self.begin_submit(Job::DeleteRecipe(recipe_id))
    }

    /// Confirm, then prepare deletion of a listed ingredient
    pub async fn prepare_delete_ingredient(&mut self, id: i64) -> Prepared {
        debug!(id, "Controller::prepare_delete_ingredient: called");
        self.guard()?;
        if self.state.view != View::Ingredients {
            return Ok(None);
        }
        let Some(name) = self.state.ingredient(id).map(|i| i.name.clone()) else {
            return Ok(None);
        };

        let message = format!("Delete ingredient \"{}\"?", name);
        if !self.confirm.confirm(&message).await {
            debug!(id, "Controller::prepare_delete_ingredient: declined");
            return Ok(None);
        }
        self.state.ingredients_view.error = None;
        self.begin_submit(Job::DeleteIngredient(id))
    }

    // === Mutations: apply ===

    /// Land a finished job and re-fetch what it touched
    pub async fn apply(&mut self, outcome: Outcome) -> Result<(), RecipeError> {
        let landed = self.land(outcome);
        match landed.refresh {
            Some(Refresh::Recipes) => self.reload_recipes().await,
            Some(Refresh::Ingredients) => self.reload_ingredients().await,
            None => {}
        }
        landed.result
    }

    /// Land a finished job without touching the network
    ///
    /// The caller owns fetching the list named in `Landed::refresh`.
    pub fn land(&mut self, outcome: Outcome) -> Landed {
        debug!(?outcome, "Controller::land: called");
        self.state.submitting = false;
        let mut refresh = None;

        let result = match outcome {
            Outcome::RecipeCreated(Ok(recipe)) => {
                info!(id = recipe.id, name = %recipe.name, "Recipe created");
                self.state.add_form = RecipeForm::new();
                if self.state.view == View::AddForm {
                    self.state.navigate(View::List);
                }
                refresh = Some(Refresh::Recipes);
                Ok(())
            }
            Outcome::RecipeCreated(Err(e)) => {
                if self.state.view == View::AddForm {
                    self.state.add_error = Some(e.to_string());
                }
                Err(e)
            }
            Outcome::RecipeUpdated { id, result: Ok(recipe) } => {
                info!(id, "Recipe updated");
                if self.state.view == (View::Detail { recipe_id: id }) {
                    self.state.detail.recipe = Some(recipe);
                    self.state.cancel_edit();
                }
                refresh = Some(Refresh::Recipes);
                Ok(())
            }
            Outcome::RecipeUpdated { id, result: Err(e) } => {
                if self.state.view == (View::Detail { recipe_id: id }) && self.state.detail.edit.is_some() {
                    self.state.detail.edit_error = Some(e.to_string());
                }
                Err(e)
            }
            Outcome::RecipeDeleted { id, result: Ok(()) } => {
                info!(id, "Recipe deleted");
                if self.state.selected == Some(id) {
                    self.state.selected = None;
                }
                if self.state.view == (View::Detail { recipe_id: id }) {
                    self.state.navigate(View::List);
                }
                refresh = Some(Refresh::Recipes);
                Ok(())
            }
            Outcome::RecipeDeleted { id, result: Err(e) } => {
                warn!(id, error = %e, "Recipe delete failed");
                if self.state.view == (View::Detail { recipe_id: id }) {
                    self.state.detail.action_error = Some(e.to_string());
                }
                Err(e)
            }
            Outcome::IngredientCreated(Ok(ingredient)) => {
                info!(id = ingredient.id, name = %ingredient.name, "Ingredient created");
                self.state.ingredients_view.form = IngredientForm::default();
                refresh = Some(Refresh::Ingredients);
                Ok(())
            }
            Outcome::IngredientCreated(Err(e)) => {
                self.state.ingredients_view.form_error = Some(e.to_string());
                Err(e)
            }
            Outcome::IngredientUpdated { id, result: Ok(_) } => {
                info!(id, "Ingredient updated");
                if self.state.ingredients_view.editing.as_ref().is_some_and(|e| e.id == id) {
                    self.state.ingredients_view.editing = None;
                }
                refresh = Some(Refresh::Ingredients);
                Ok(())
            }
            Outcome::IngredientUpdated { id, result: Err(e) } => {
                match self.state.ingredients_view.editing.as_mut() {
                    Some(edit) if edit.id == id => edit.error = Some(e.to_string()),
                    _ => self.state.ingredients_view.error = Some(e.to_string()),
                }
                Err(e)
            }
            Outcome::IngredientDeleted { id, result: Ok(()) } => {
                info!(id, "Ingredient deleted");
                if self.state.ingredients_view.editing.as_ref().is_some_and(|e| e.id == id) {
                    self.state.ingredients_view.editing = None;
                }
                refresh = Some(Refresh::Ingredients);
                Ok(())
            }
            Outcome::IngredientDeleted { id, result: Err(e) } => {
                warn!(id, error = %e, "Ingredient delete failed");
                self.state.ingredients_view.error = Some(e.to_string());
                Err(e)
            }
        };

        self.publish();
        Landed { result, refresh }
    }

    // === Mutations: direct ===

    async fn run(&mut self, prepared: Prepared) -> Result<bool, RecipeError> {
        let Some(job) = prepared? else {
            return Ok(false);
        };
        let api = self.api();
        let outcome = job.run(api.as_ref()).await;
        self.apply(outcome).await?;
        Ok(true)
    }

    /// Submit the add form (create) or the detail edit form (update)
    pub async fn submit_recipe(&mut self, target: RecipeFormTarget) -> Result<bool, RecipeError> {
        let prepared = self.prepare_submit_recipe(target);
        self.run(prepared).await
    }

    pub async fn delete_recipe(&mut self) -> Result<bool, RecipeError> {
        let prepared = self.prepare_delete_recipe().await;
        self.run(prepared).await
    }

    pub async fn create_ingredient(&mut self) -> Result<bool, RecipeError> {
        let prepared = self.prepare_create_ingredient();
        self.run(prepared).await
    }

    pub async fn save_ingredient_edit(&mut self) -> Result<bool, RecipeError> {
        let prepared = self.prepare_save_ingredient();
        self.run(prepared).await
    }

    pub async fn delete_ingredient(&mut self, id: i64) -> Result<bool, RecipeError> {
        let prepared = self.prepare_delete_ingredient(id).await;
        self.run(prepared).await
    }
}
