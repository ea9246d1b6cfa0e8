//! Actor wrapper around the controller
//!
//! The UI sends `Intent`s and watches `ViewState` snapshots. Requests run on
//! spawned tasks and post their results back as intents, so the actor never
//! blocks on the network while the user keeps typing.

use std::future::Future;

use eyre::{Result, eyre};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use super::driver::{Controller, IngredientFormTarget, Nav, Outcome, Prepared, RecipeFormTarget, Refresh};
use super::state::{DetailTicket, ViewState};
use crate::domain::{Ingredient, Recipe};
use crate::error::RecipeError;
use crate::forms::{FieldEdit, IngredientField, RecipeField};

/// Everything the UI can ask of the controller
#[derive(Debug)]
pub enum Intent {
    Show(Nav),
    OpenDetail(i64),
    /// Internal: a detail fetch finished
    DetailLoaded {
        ticket: DetailTicket,
        result: Result<Recipe, RecipeError>,
    },
    Back,
    Reload,
    DismissBanner,
    BeginEdit,
    CancelEdit,
    EditRecipe {
        target: RecipeFormTarget,
        field: RecipeField,
        edit: FieldEdit,
    },
    AddLine(RecipeFormTarget),
    RemoveLine(RecipeFormTarget, usize),
    SubmitRecipe(RecipeFormTarget),
    DeleteRecipe,
    EditIngredient {
        target: IngredientFormTarget,
        field: IngredientField,
        edit: FieldEdit,
    },
    CreateIngredient,
    BeginIngredientEdit(i64),
    CancelIngredientEdit,
    SaveIngredientEdit,
    DeleteIngredient(i64),
    /// Internal: a mutation finished
    Finished(Outcome),
    /// Internal: a background list fetch finished
    RecipesLoaded(Result<Vec<Recipe>, RecipeError>),
    IngredientsLoaded(Result<Vec<Ingredient>, RecipeError>),
    Shutdown,
}

/// Cheap, cloneable handle to a running controller
#[derive(Clone)]
pub struct ControllerHandle {
    tx: mpsc::Sender<Intent>,
    state_rx: watch::Receiver<ViewState>,
}

impl ControllerHandle {
    /// Spawn the actor; it runs the initial load before taking intents
    pub fn spawn(controller: Controller) -> Self {
        let (state_tx, state_rx) = watch::channel(controller.state().clone());
        let controller = controller.with_publisher(state_tx);
        let (tx, rx) = mpsc::channel(256);

        tokio::spawn(actor_loop(controller, rx, tx.downgrade()));
        info!("Controller actor spawned");

        Self { tx, state_rx }
    }

    pub async fn send(&self, intent: Intent) -> Result<()> {
        debug!(?intent, "ControllerHandle::send: called");
        self.tx.send(intent).await.map_err(|_| eyre!("Controller has stopped"))
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state_rx.clone()
    }

    pub fn snapshot(&self) -> ViewState {
        self.state_rx.borrow().clone()
    }

    /// Wait until a snapshot satisfies `predicate`
    pub async fn wait_for(&self, predicate: impl FnMut(&ViewState) -> bool) -> Result<ViewState> {
        let mut rx = self.subscribe();
        let state = rx
            .wait_for(predicate)
            .await
            .map_err(|_| eyre!("Controller has stopped"))?;
        Ok(state.clone())
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.send(Intent::Shutdown).await
    }
}

async fn actor_loop(mut controller: Controller, mut rx: mpsc::Receiver<Intent>, weak: mpsc::WeakSender<Intent>) {
    controller.start().await;

    while let Some(intent) = rx.recv().await {
        if matches!(intent, Intent::Shutdown) {
            info!("Controller actor shutting down");
            break;
        }
        handle_intent(&mut controller, intent, &weak).await;
    }
    debug!("actor_loop: exited");
}

async fn handle_intent(controller: &mut Controller, intent: Intent, weak: &mpsc::WeakSender<Intent>) {
    match intent {
        Intent::Show(nav) => controller.show(nav),
        Intent::OpenDetail(id) => {
            let ticket = controller.begin_detail(id);
            let api = controller.api();
            post_back(weak, async move {
                let result = api.get_recipe(id).await;
                Intent::DetailLoaded { ticket, result }
            });
        }
        Intent::DetailLoaded { ticket, result } => {
            controller.finish_detail(ticket, result);
        }
        Intent::Back => controller.back(),
        Intent::Reload => {
            refresh(controller, Refresh::Recipes, weak);
            refresh(controller, Refresh::Ingredients, weak);
        }
        Intent::DismissBanner => controller.dismiss_banner(),
        Intent::BeginEdit => {
            controller.begin_edit();
        }
        Intent::CancelEdit => controller.cancel_edit(),
        Intent::EditRecipe { target, field, edit } => {
            controller.edit_recipe_field(target, field, edit);
        }
        Intent::AddLine(target) => controller.add_line(target),
        Intent::RemoveLine(target, idx) => {
            controller.remove_line(target, idx);
        }
        Intent::SubmitRecipe(target) => {
            let prepared = controller.prepare_submit_recipe(target);
            dispatch(controller, prepared, weak);
        }
        Intent::DeleteRecipe => {
            let prepared = controller.prepare_delete_recipe().await;
            dispatch(controller, prepared, weak);
        }
        Intent::EditIngredient { target, field, edit } => {
            controller.edit_ingredient_field(target, field, edit);
        }
        Intent::CreateIngredient => {
            let prepared = controller.prepare_create_ingredient();
            dispatch(controller, prepared, weak);
        }
        Intent::BeginIngredientEdit(id) => {
            controller.begin_ingredient_edit(id);
        }
        Intent::CancelIngredientEdit => controller.cancel_ingredient_edit(),
        Intent::SaveIngredientEdit => {
            let prepared = controller.prepare_save_ingredient();
            dispatch(controller, prepared, weak);
        }
        Intent::DeleteIngredient(id) => {
            let prepared = controller.prepare_delete_ingredient(id).await;
            dispatch(controller, prepared, weak);
        }
        Intent::Finished(outcome) => {
            let landed = controller.land(outcome);
            if let Err(e) = &landed.result {
                debug!(error = %e, "handle_intent: request failed");
            }
            if let Some(list) = landed.refresh {
                refresh(controller, list, weak);
            }
        }
        Intent::RecipesLoaded(result) => controller.finish_recipes(result),
        Intent::IngredientsLoaded(result) => controller.finish_ingredients(result),
        Intent::Shutdown => {}
    }
}

/// Run a prepared job off the actor and post its outcome back
fn dispatch(controller: &Controller, prepared: Prepared, weak: &mpsc::WeakSender<Intent>) {
    match prepared {
        Ok(Some(job)) => {
            let api = controller.api();
            post_back(weak, async move { Intent::Finished(job.run(api.as_ref()).await) });
        }
        Ok(None) => debug!("dispatch: nothing to do"),
        Err(e) => debug!(error = %e, "dispatch: rejected before sending"),
    }
}

/// Re-fetch a list off the actor
fn refresh(controller: &Controller, list: Refresh, weak: &mpsc::WeakSender<Intent>) {
    let api = controller.api();
    match list {
        Refresh::Recipes => post_back(weak, async move { Intent::RecipesLoaded(api.list_recipes().await) }),
        Refresh::Ingredients => post_back(weak, async move { Intent::IngredientsLoaded(api.list_ingredients().await) }),
    }
}

fn post_back<F>(weak: &mpsc::WeakSender<Intent>, work: F)
where
    F: Future<Output = Intent> + Send + 'static,
{
    let Some(tx) = weak.upgrade() else {
        warn!("post_back: controller gone, dropping work");
        return;
    };
    tokio::spawn(async move {
        let intent = work.await;
        if tx.send(intent).await.is_err() {
            debug!("post_back: controller stopped before result landed");
        }
    });
}
