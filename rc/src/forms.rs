//! Editable field sets for recipes and ingredients
//!
//! A form is plain strings while the user types. `to_payload` is the single
//! place where a form becomes something the API accepts: strings are trimmed,
//! names are required, incomplete recipe lines are dropped.

use tracing::debug;

use crate::domain::{Ingredient, IngredientPayload, Recipe, RecipeLinePayload, RecipePayload};
use crate::error::RecipeError;

pub const MAX_RECIPE_NAME: usize = 200;
pub const MAX_INGREDIENT_NAME: usize = 120;
pub const MAX_UNIT: usize = 32;
pub const MAX_INSTRUCTIONS: usize = 5000;
pub const MAX_QUANTITY: usize = 64;
const MAX_ID_DIGITS: usize = 20;

/// A single change to one text field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldEdit {
    Insert(char),
    Backspace,
    Clear,
    /// Replace the whole value, cut to the field's maximum
    Set(String),
}

/// Apply an edit under a character limit; returns whether the value changed
fn apply_edit(value: &mut String, edit: FieldEdit, max: usize) -> bool {
    match edit {
        FieldEdit::Insert(c) => {
            if value.chars().count() >= max {
                return false;
            }
            value.push(c);
            true
        }
        FieldEdit::Backspace => value.pop().is_some(),
        FieldEdit::Clear => {
            let changed = !value.is_empty();
            value.clear();
            changed
        }
        FieldEdit::Set(new) => {
            let new: String = new.chars().take(max).collect();
            let changed = *value != new;
            *value = new;
            changed
        }
    }
}

/// Addressable fields of a recipe form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeField {
    Name,
    Instructions,
    Ingredient(usize),
    Quantity(usize),
    UnitOverride(usize),
}

impl RecipeField {
    pub fn max_len(self) -> usize {
        match self {
            Self::Name => MAX_RECIPE_NAME,
            Self::Instructions => MAX_INSTRUCTIONS,
            Self::Ingredient(_) => MAX_ID_DIGITS,
            Self::Quantity(_) => MAX_QUANTITY,
            Self::UnitOverride(_) => MAX_UNIT,
        }
    }

    /// Line index for per-line fields
    pub fn line(self) -> Option<usize> {
        match self {
            Self::Ingredient(i) | Self::Quantity(i) | Self::UnitOverride(i) => Some(i),
            _ => None,
        }
    }
}

/// One ingredient row as typed
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LineDraft {
    /// Raw selector value; anything that is not an integer means "not selected"
    pub ingredient_id: String,
    pub quantity: String,
    pub unit_override: String,
}

impl LineDraft {
    pub fn selected_ingredient(&self) -> Option<i64> {
        self.ingredient_id.trim().parse().ok()
    }

    fn to_payload(&self) -> Option<RecipeLinePayload> {
        let ingredient_id = self.selected_ingredient()?;
        let quantity = self.quantity.trim();
        if quantity.is_empty() {
            return None;
        }
        let unit_override = self.unit_override.trim();
        Some(RecipeLinePayload {
            ingredient_id,
            quantity: quantity.to_string(),
            unit_override: (!unit_override.is_empty()).then(|| unit_override.to_string()),
        })
    }
}

/// Lines that will be sent, in display order
pub fn line_payloads(lines: &[LineDraft]) -> Vec<RecipeLinePayload> {
    lines.iter().filter_map(LineDraft::to_payload).collect()
}

/// Add/edit form for a recipe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeForm {
    pub name: String,
    pub instructions: String,
    /// Never empty
    pub lines: Vec<LineDraft>,
}

impl Default for RecipeForm {
    fn default() -> Self {
        Self::new()
    }
}

impl RecipeForm {
    /// Blank form with one empty line
    pub fn new() -> Self {
        Self {
            name: String::new(),
            instructions: String::new(),
            lines: vec![LineDraft::default()],
        }
    }

    /// Pre-fill from a fetched recipe
    ///
    /// Only a stored override fills the unit column; the ingredient's own unit
    /// stays a fallback so editing does not pin it.
    pub fn from_recipe(recipe: &Recipe) -> Self {
        debug!(recipe_id = recipe.id, "RecipeForm::from_recipe: called");
        let mut lines: Vec<LineDraft> = recipe
            .ingredients
            .iter()
            .map(|line| LineDraft {
                ingredient_id: line.ingredient_id.to_string(),
                quantity: line.quantity.clone(),
                unit_override: line.unit_override.clone().unwrap_or_default(),
            })
            .collect();
        if lines.is_empty() {
            lines.push(LineDraft::default());
        }
        Self {
            name: recipe.name.clone(),
            instructions: recipe.instructions.clone(),
            lines,
        }
    }

    pub fn add_line(&mut self) {
        self.lines.push(LineDraft::default());
    }

    /// Remove a line; the last remaining line is kept
    pub fn remove_line(&mut self, idx: usize) -> bool {
        if self.lines.len() <= 1 || idx >= self.lines.len() {
            return false;
        }
        self.lines.remove(idx);
        true
    }

    pub fn value(&self, field: RecipeField) -> Option<&str> {
        match field {
            RecipeField::Name => Some(&self.name),
            RecipeField::Instructions => Some(&self.instructions),
            RecipeField::Ingredient(i) => self.lines.get(i).map(|l| l.ingredient_id.as_str()),
            RecipeField::Quantity(i) => self.lines.get(i).map(|l| l.quantity.as_str()),
            RecipeField::UnitOverride(i) => self.lines.get(i).map(|l| l.unit_override.as_str()),
        }
    }

    pub fn apply(&mut self, field: RecipeField, edit: FieldEdit) -> bool {
        let max = field.max_len();
        let target = match field {
            RecipeField::Name => Some(&mut self.name),
            RecipeField::Instructions => Some(&mut self.instructions),
            RecipeField::Ingredient(i) => self.lines.get_mut(i).map(|l| &mut l.ingredient_id),
            RecipeField::Quantity(i) => self.lines.get_mut(i).map(|l| &mut l.quantity),
            RecipeField::UnitOverride(i) => self.lines.get_mut(i).map(|l| &mut l.unit_override),
        };
        match target {
            Some(value) => apply_edit(value, edit, max),
            None => false,
        }
    }

    /// Number of focusable fields: name, instructions, then three per line
    pub fn field_count(&self) -> usize {
        2 + 3 * self.lines.len()
    }

    /// Field at a focus position, wrapping past the end
    pub fn field_at(&self, idx: usize) -> RecipeField {
        match idx % self.field_count() {
            0 => RecipeField::Name,
            1 => RecipeField::Instructions,
            n => {
                let line = (n - 2) / 3;
                match (n - 2) % 3 {
                    0 => RecipeField::Ingredient(line),
                    1 => RecipeField::Quantity(line),
                    _ => RecipeField::UnitOverride(line),
                }
            }
        }
    }

    pub fn to_payload(&self) -> Result<RecipePayload, RecipeError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(RecipeError::validation("Recipe name is required"));
        }
        let ingredients = line_payloads(&self.lines);
        debug!(
            drafted = self.lines.len(),
            kept = ingredients.len(),
            "RecipeForm::to_payload: built lines"
        );
        Ok(RecipePayload {
            name: name.to_string(),
            instructions: self.instructions.trim().to_string(),
            ingredients,
        })
    }
}

/// Fields of an ingredient form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IngredientField {
    #[default]
    Name,
    Unit,
}

impl IngredientField {
    pub fn max_len(self) -> usize {
        match self {
            Self::Name => MAX_INGREDIENT_NAME,
            Self::Unit => MAX_UNIT,
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Self::Name => Self::Unit,
            Self::Unit => Self::Name,
        }
    }
}

/// Add form or inline editor for an ingredient
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IngredientForm {
    pub name: String,
    pub unit: String,
}

impl IngredientForm {
    pub fn from_ingredient(ingredient: &Ingredient) -> Self {
        Self {
            name: ingredient.name.clone(),
            unit: ingredient.unit.clone().unwrap_or_default(),
        }
    }

    pub fn value(&self, field: IngredientField) -> &str {
        match field {
            IngredientField::Name => &self.name,
            IngredientField::Unit => &self.unit,
        }
    }

    pub fn apply(&mut self, field: IngredientField, edit: FieldEdit) -> bool {
        let value = match field {
            IngredientField::Name => &mut self.name,
            IngredientField::Unit => &mut self.unit,
        };
        apply_edit(value, edit, field.max_len())
    }

    pub fn to_payload(&self) -> Result<IngredientPayload, RecipeError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(RecipeError::validation("Ingredient name is required"));
        }
        Ok(IngredientPayload {
            name: name.to_string(),
            unit: self.unit.trim().to_string(),
        })
    }
}
