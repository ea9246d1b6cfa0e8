//! Key handling and UI-local state
//!
//! The App never touches recipe data. It keeps cursors, field focus and the
//! open confirm dialog, and turns key presses into controller intents.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::debug;

use crate::controller::{ConfirmRequest, IngredientFormTarget, Intent, Nav, RecipeFormTarget, View, ViewState};
use crate::forms::{FieldEdit, IngredientField, RecipeField, RecipeForm};

/// What the runner should do after a key press
#[derive(Debug)]
pub enum Action {
    Quit,
    Send(Intent),
}

/// Open confirm dialog; the reply goes back to the waiting controller
#[derive(Debug)]
pub struct ConfirmDialog {
    pub message: String,
    /// false = No, true = Yes
    pub selected_button: bool,
    reply: Option<tokio::sync::oneshot::Sender<bool>>,
}

impl ConfirmDialog {
    fn answer(mut self, yes: bool) {
        debug!(message = %self.message, yes, "ConfirmDialog::answer: called");
        if let Some(reply) = self.reply.take() {
            let _ = reply.send(yes);
        }
    }
}

impl From<ConfirmRequest> for ConfirmDialog {
    fn from(request: ConfirmRequest) -> Self {
        Self {
            message: request.message,
            selected_button: false,
            reply: Some(request.reply),
        }
    }
}

/// Which half of the ingredients screen has the keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IngredientsFocus {
    #[default]
    List,
    Form,
}

/// UI-local state
#[derive(Debug, Default)]
pub struct App {
    pub list_cursor: usize,
    pub ingredient_cursor: usize,
    /// Focus index into the active recipe form
    pub focus: usize,
    pub ingredient_field: IngredientField,
    pub ingredients_focus: IngredientsFocus,
    pub dialog: Option<ConfirmDialog>,
    last_view: View,
    last_recipe_edit: bool,
    last_inline_edit: Option<i64>,
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show a confirm dialog; a dialog already open is answered "no"
    pub fn open_dialog(&mut self, request: ConfirmRequest) {
        if let Some(previous) = self.dialog.take() {
            previous.answer(false);
        }
        self.dialog = Some(request.into());
    }

    /// Follow a new snapshot: reset focus on screen changes, clamp cursors
    pub fn sync(&mut self, state: &ViewState) {
        let recipe_edit = state.detail.edit.is_some();
        let inline_edit = state.ingredients_view.editing.as_ref().map(|e| e.id);

        if state.view != self.last_view || recipe_edit != self.last_recipe_edit {
            self.focus = 0;
            self.ingredient_field = IngredientField::Name;
            if state.view != self.last_view {
                self.ingredients_focus = IngredientsFocus::List;
            }
        }
        if inline_edit != self.last_inline_edit {
            self.ingredient_field = IngredientField::Name;
        }
        self.last_view = state.view;
        self.last_recipe_edit = recipe_edit;
        self.last_inline_edit = inline_edit;

        self.list_cursor = clamp(self.list_cursor, state.recipes.len());
        self.ingredient_cursor = clamp(self.ingredient_cursor, state.ingredients.len());
        if let Some(form) = active_form(state) {
            self.focus = clamp(self.focus, form.field_count());
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, state: &ViewState) -> Option<Action> {
        debug!(?key, view = ?state.view, "App::handle_key: called");

        if self.dialog.is_some() {
            self.handle_confirm_key(key);
            return None;
        }

        match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => return Some(Action::Quit),
            (KeyCode::F(1), _) => return show(Nav::Recipes),
            (KeyCode::F(2), _) => return show(Nav::AddRecipe),
            (KeyCode::F(3), _) => return show(Nav::Ingredients),
            _ => {}
        }

        match state.view {
            View::Loading => (key.code == KeyCode::Char('q')).then_some(Action::Quit),
            View::List => self.handle_list_key(key, state),
            View::Detail { recipe_id } => match &state.detail.edit {
                Some(form) => self.handle_recipe_form_key(key, RecipeFormTarget::Edit, form, state),
                None => handle_detail_key(key, recipe_id),
            },
            View::AddForm => self.handle_recipe_form_key(key, RecipeFormTarget::Add, &state.add_form, state),
            View::Ingredients => {
                if state.ingredients_view.editing.is_some() {
                    self.handle_inline_edit_key(key)
                } else if self.ingredients_focus == IngredientsFocus::Form {
                    self.handle_ingredient_form_key(key)
                } else {
                    self.handle_ingredients_list_key(key, state)
                }
            }
        }
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) {
        debug!(?key, "App::handle_confirm_key: called");
        let Some(dialog) = self.dialog.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                if let Some(dialog) = self.dialog.take() {
                    dialog.answer(false);
                }
            }
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                if let Some(dialog) = self.dialog.take() {
                    dialog.answer(true);
                }
            }
            KeyCode::Enter => {
                if let Some(dialog) = self.dialog.take() {
                    let yes = dialog.selected_button;
                    dialog.answer(yes);
                }
            }
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Left | KeyCode::Right | KeyCode::Char('h') | KeyCode::Char('l') => {
                dialog.selected_button = !dialog.selected_button;
            }
            _ => {}
        }
    }

    fn handle_list_key(&mut self, key: KeyEvent, state: &ViewState) -> Option<Action> {
        match key.code {
            KeyCode::Char('q') => Some(Action::Quit),
            KeyCode::Char('j') | KeyCode::Down => {
                self.list_cursor = step(self.list_cursor, state.recipes.len(), 1);
                None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.list_cursor = step(self.list_cursor, state.recipes.len(), -1);
                None
            }
            KeyCode::Enter | KeyCode::Char('l') => state
                .recipes
                .get(self.list_cursor)
                .map(|r| Action::Send(Intent::OpenDetail(r.id))),
            KeyCode::Char('a') => show(Nav::AddRecipe),
            KeyCode::Char('i') => show(Nav::Ingredients),
            KeyCode::Char('r') => send(Intent::Reload),
            KeyCode::Char('x') if state.banner.is_some() => send(Intent::DismissBanner),
            _ => None,
        }
    }

    fn handle_recipe_form_key(
        &mut self,
        key: KeyEvent,
        target: RecipeFormTarget,
        form: &RecipeForm,
        state: &ViewState,
    ) -> Option<Action> {
        let count = form.field_count();
        let field = form.field_at(self.focus);
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Esc => match target {
                RecipeFormTarget::Add => show(Nav::Recipes),
                RecipeFormTarget::Edit => send(Intent::CancelEdit),
            },
            KeyCode::Char('s') if ctrl => send(Intent::SubmitRecipe(target)),
            KeyCode::Char('a') if ctrl => send(Intent::AddLine(target)),
            KeyCode::Char('d') if ctrl => field.line().map(|idx| Action::Send(Intent::RemoveLine(target, idx))),
            KeyCode::Tab | KeyCode::Down => {
                self.focus = (self.focus + 1) % count;
                None
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.focus = (self.focus + count - 1) % count;
                None
            }
            KeyCode::Enter if field == RecipeField::Instructions => edit_recipe(target, field, FieldEdit::Insert('\n')),
            KeyCode::Enter => send(Intent::SubmitRecipe(target)),
            _ => match field {
                RecipeField::Ingredient(idx) => {
                    let current = form.lines.get(idx).and_then(|l| l.selected_ingredient());
                    match key.code {
                        KeyCode::Right | KeyCode::Char(' ') => cycle_ingredient(state, current, 1)
                            .and_then(|id| edit_recipe(target, field, FieldEdit::Set(id.to_string()))),
                        KeyCode::Left => cycle_ingredient(state, current, -1)
                            .and_then(|id| edit_recipe(target, field, FieldEdit::Set(id.to_string()))),
                        KeyCode::Backspace | KeyCode::Delete => edit_recipe(target, field, FieldEdit::Clear),
                        _ => None,
                    }
                }
                _ => match key.code {
                    KeyCode::Char(c) if !ctrl => edit_recipe(target, field, FieldEdit::Insert(c)),
                    KeyCode::Backspace => edit_recipe(target, field, FieldEdit::Backspace),
                    _ => None,
                },
            },
        }
    }

    fn handle_ingredients_list_key(&mut self, key: KeyEvent, state: &ViewState) -> Option<Action> {
        let selected = state.ingredients.get(self.ingredient_cursor).map(|i| i.id);
        match key.code {
            KeyCode::Char('q') => Some(Action::Quit),
            KeyCode::Esc => show(Nav::Recipes),
            KeyCode::Char('j') | KeyCode::Down => {
                self.ingredient_cursor = step(self.ingredient_cursor, state.ingredients.len(), 1);
                None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.ingredient_cursor = step(self.ingredient_cursor, state.ingredients.len(), -1);
                None
            }
            KeyCode::Tab | KeyCode::Char('a') | KeyCode::Char('n') => {
                self.ingredients_focus = IngredientsFocus::Form;
                self.ingredient_field = IngredientField::Name;
                None
            }
            KeyCode::Enter | KeyCode::Char('e') => selected.map(|id| Action::Send(Intent::BeginIngredientEdit(id))),
            KeyCode::Char('d') => selected.map(|id| Action::Send(Intent::DeleteIngredient(id))),
            KeyCode::Char('r') => send(Intent::Reload),
            _ => None,
        }
    }

    fn handle_ingredient_form_key(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Esc => {
                self.ingredients_focus = IngredientsFocus::List;
                None
            }
            KeyCode::Enter => send(Intent::CreateIngredient),
            _ => self.ingredient_text_key(key, IngredientFormTarget::New),
        }
    }

    fn handle_inline_edit_key(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Esc => send(Intent::CancelIngredientEdit),
            KeyCode::Enter => send(Intent::SaveIngredientEdit),
            _ => self.ingredient_text_key(key, IngredientFormTarget::Inline),
        }
    }

    fn ingredient_text_key(&mut self, key: KeyEvent, target: IngredientFormTarget) -> Option<Action> {
        let field = self.ingredient_field;
        let edit = match key.code {
            KeyCode::Tab | KeyCode::BackTab => {
                self.ingredient_field = field.toggle();
                return None;
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => FieldEdit::Insert(c),
            KeyCode::Backspace => FieldEdit::Backspace,
            _ => return None,
        };
        send(Intent::EditIngredient { target, field, edit })
    }
}

fn handle_detail_key(key: KeyEvent, recipe_id: i64) -> Option<Action> {
    match key.code {
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Esc | KeyCode::Char('b') | KeyCode::Char('h') | KeyCode::Backspace => send(Intent::Back),
        KeyCode::Char('e') => send(Intent::BeginEdit),
        KeyCode::Char('d') => send(Intent::DeleteRecipe),
        KeyCode::Char('r') => send(Intent::OpenDetail(recipe_id)),
        _ => None,
    }
}

/// The recipe form currently on screen, if any
pub(crate) fn active_form(state: &ViewState) -> Option<&RecipeForm> {
    match state.view {
        View::AddForm => Some(&state.add_form),
        View::Detail { .. } => state.detail.edit.as_ref(),
        _ => None,
    }
}

fn send(intent: Intent) -> Option<Action> {
    Some(Action::Send(intent))
}

fn show(nav: Nav) -> Option<Action> {
    send(Intent::Show(nav))
}

fn edit_recipe(target: RecipeFormTarget, field: RecipeField, edit: FieldEdit) -> Option<Action> {
    send(Intent::EditRecipe { target, field, edit })
}

fn clamp(cursor: usize, len: usize) -> usize {
    cursor.min(len.saturating_sub(1))
}

fn step(cursor: usize, len: usize, delta: isize) -> usize {
    if len == 0 {
        return 0;
    }
    cursor.saturating_add_signed(delta).min(len - 1)
}

/// Next ingredient id in list order, wrapping through "none selected"
fn cycle_ingredient(state: &ViewState, current: Option<i64>, delta: isize) -> Option<i64> {
    let ids: Vec<i64> = state.ingredients.iter().map(|i| i.id).collect();
    if ids.is_empty() {
        return None;
    }
    let pos = current.and_then(|id| ids.iter().position(|&i| i == id));
    let next = match (pos, delta >= 0) {
        (None, true) => 0,
        (None, false) => ids.len() - 1,
        (Some(p), true) => (p + 1) % ids.len(),
        (Some(p), false) => (p + ids.len() - 1) % ids.len(),
    };
    Some(ids[next])
}
