//! Records returned by the store and the inputs it accepts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

pub const MAX_INGREDIENT_NAME: usize = 120;
pub const MAX_UNIT: usize = 32;
pub const MAX_RECIPE_NAME: usize = 200;
pub const MAX_INSTRUCTIONS: usize = 5000;
pub const MAX_QUANTITY: usize = 64;
pub const MAX_LINES: usize = 100;

const MISSING: &str = "Missing data for required field.";

/// A reusable named ingredient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
    /// Default unit, empty when the ingredient has none
    pub unit: String,
}

/// A recipe with its joined ingredient lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: i64,
    pub name: String,
    pub instructions: String,
    pub created_at: DateTime<Utc>,
    pub ingredients: Vec<RecipeLine>,
}

/// One ingredient line of a recipe, as served
///
/// `ingredient_name` and `unit` are computed from the joined ingredient row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeLine {
    pub ingredient_id: i64,
    pub ingredient_name: String,
    pub quantity: String,
    /// Effective unit: the override if present, else the ingredient's unit
    pub unit: String,
    pub unit_override: Option<String>,
}

/// Body of `POST /ingredients` and `PATCH /ingredients/{id}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IngredientInput {
    pub name: Option<String>,
    pub unit: Option<String>,
}

impl IngredientInput {
    pub fn new(name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            unit: Some(unit.into()),
        }
    }

    /// Schema check; `partial` relaxes required fields for PATCH
    pub fn check(&self, partial: bool) -> Result<(), StoreError> {
        let mut problems = Vec::new();
        check_text(&mut problems, "name", self.name.as_deref(), 1, MAX_INGREDIENT_NAME, !partial);
        check_text(&mut problems, "unit", self.unit.as_deref(), 0, MAX_UNIT, false);
        into_result(problems)
    }
}

/// Body of `POST /recipes` and `PATCH /recipes/{id}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeInput {
    pub name: Option<String>,
    pub instructions: Option<String>,
    /// When present on PATCH, replaces every existing line
    pub ingredients: Option<Vec<LineInput>>,
}

/// One requested recipe line
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LineInput {
    pub ingredient_id: Option<i64>,
    pub quantity: Option<String>,
    pub unit_override: Option<String>,
}

impl LineInput {
    pub fn new(ingredient_id: i64, quantity: impl Into<String>) -> Self {
        Self {
            ingredient_id: Some(ingredient_id),
            quantity: Some(quantity.into()),
            unit_override: None,
        }
    }

    pub fn with_unit_override(mut self, unit: impl Into<String>) -> Self {
        self.unit_override = Some(unit.into());
        self
    }
}

impl RecipeInput {
    pub fn new(name: impl Into<String>, instructions: impl Into<String>, ingredients: Vec<LineInput>) -> Self {
        Self {
            name: Some(name.into()),
            instructions: Some(instructions.into()),
            ingredients: Some(ingredients),
        }
    }

    /// Schema check; `partial` relaxes required fields for PATCH
    pub fn check(&self, partial: bool) -> Result<(), StoreError> {
        let mut problems = Vec::new();
        check_text(&mut problems, "name", self.name.as_deref(), 1, MAX_RECIPE_NAME, !partial);
        check_text(
            &mut problems,
            "instructions",
            self.instructions.as_deref(),
            0,
            MAX_INSTRUCTIONS,
            false,
        );

        if let Some(lines) = &self.ingredients {
            if lines.len() > MAX_LINES {
                problems.push(format!("ingredients: Longer than maximum length {}.", MAX_LINES));
            }
            for (idx, line) in lines.iter().enumerate() {
                if line.ingredient_id.is_none() {
                    problems.push(format!("ingredients.{}.ingredient_id: {}", idx, MISSING));
                }
                let quantity_field = format!("ingredients.{}.quantity", idx);
                check_text(&mut problems, &quantity_field, line.quantity.as_deref(), 1, MAX_QUANTITY, true);
                let unit_field = format!("ingredients.{}.unit_override", idx);
                check_text(&mut problems, &unit_field, line.unit_override.as_deref(), 0, MAX_UNIT, false);
            }
        }

        into_result(problems)
    }
}

fn check_text(problems: &mut Vec<String>, field: &str, value: Option<&str>, min: usize, max: usize, required: bool) {
    match value {
        None if required => problems.push(format!("{}: {}", field, MISSING)),
        None => {}
        Some(v) => {
            let len = v.chars().count();
            if len < min || len > max {
                if min == 0 {
                    problems.push(format!("{}: Longer than maximum length {}.", field, max));
                } else {
                    problems.push(format!("{}: Length must be between {} and {}.", field, min, max));
                }
            }
        }
    }
}

fn into_result(problems: Vec<String>) -> Result<(), StoreError> {
    if problems.is_empty() {
        Ok(())
    } else {
        Err(StoreError::Invalid(problems.join("; ")))
    }
}

/// Trim and cut a string to at most `max` characters
pub(crate) fn clip(value: &str, max: usize) -> String {
    value.trim().chars().take(max).collect()
}
