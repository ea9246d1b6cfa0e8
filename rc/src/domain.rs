//! Entities as served by the REST API, and the payloads sent back to it

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A reusable named ingredient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
    /// Default unit; an empty string on the wire means none
    #[serde(default, deserialize_with = "empty_as_none")]
    pub unit: Option<String>,
}

impl Ingredient {
    /// Label used in selectors, e.g. `Flour (g)`
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.unit.as_deref().unwrap_or("—"))
    }
}

/// A recipe with its ordered ingredient lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ingredients: Vec<RecipeIngredient>,
}

impl Recipe {
    pub fn ingredient_count(&self) -> usize {
        self.ingredients.len()
    }

    /// "1 ingredient", "3 ingredients"
    pub fn ingredient_summary(&self) -> String {
        let n = self.ingredient_count();
        format!("{} ingredient{}", n, if n == 1 { "" } else { "s" })
    }
}

/// One line within a recipe
///
/// `ingredient_name` and `unit` are join fields computed by the server and
/// never sent back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub ingredient_id: i64,
    #[serde(default)]
    pub ingredient_name: String,
    pub quantity: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub unit: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub unit_override: Option<String>,
}

impl RecipeIngredient {
    /// Override if present, else the ingredient's own unit
    pub fn effective_unit(&self) -> Option<&str> {
        self.unit_override.as_deref().or(self.unit.as_deref())
    }
}

/// Body for creating or updating an ingredient
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngredientPayload {
    pub name: String,
    pub unit: String,
}

/// Body for creating or updating a recipe; `ingredients` replaces every line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipePayload {
    pub name: String,
    pub instructions: String,
    pub ingredients: Vec<RecipeLinePayload>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeLinePayload {
    pub ingredient_id: i64,
    pub quantity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_override: Option<String>,
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_unit_is_none() {
        let ing: Ingredient = serde_json::from_value(json!({"id": 1, "name": "Salt", "unit": ""})).unwrap();
        assert_eq!(ing.unit, None);
        assert_eq!(ing.label(), "Salt (—)");

        let ing: Ingredient = serde_json::from_value(json!({"id": 2, "name": "Flour", "unit": "g"})).unwrap();
        assert_eq!(ing.unit.as_deref(), Some("g"));
    }

    #[test]
    fn test_recipe_decodes_server_shape() {
        let recipe: Recipe = serde_json::from_value(json!({
            "id": 3,
            "name": "Bread",
            "instructions": "Bake",
            "created_at": "2024-05-01T10:00:00Z",
            "ingredients": [
                {"ingredient_id": 1, "ingredient_name": "Flour", "quantity": "500", "unit": "g", "unit_override": null}
            ]
        }))
        .unwrap();
        assert_eq!(recipe.ingredient_count(), 1);
        assert_eq!(recipe.ingredients[0].effective_unit(), Some("g"));
        assert!(recipe.created_at.is_some());
    }

    #[test]
    fn test_effective_unit_prefers_override() {
        let line = RecipeIngredient {
            ingredient_id: 1,
            ingredient_name: "Flour".to_string(),
            quantity: "2".to_string(),
            unit: Some("g".to_string()),
            unit_override: Some("cups".to_string()),
        };
        assert_eq!(line.effective_unit(), Some("cups"));
    }

    #[test]
    fn test_line_payload_omits_missing_override() {
        let line = RecipeLinePayload {
            ingredient_id: 4,
            quantity: "1".to_string(),
            unit_override: None,
        };
        assert_eq!(serde_json::to_value(&line).unwrap(), json!({"ingredient_id": 4, "quantity": "1"}));
    }

    #[test]
    fn test_ingredient_summary_pluralizes() {
        let mut recipe = Recipe {
            id: 1,
            name: "Toast".to_string(),
            instructions: String::new(),
            created_at: None,
            ingredients: vec![],
        };
        assert_eq!(recipe.ingredient_summary(), "0 ingredients");
        recipe.ingredients.push(RecipeIngredient {
            ingredient_id: 1,
            ingredient_name: "Bread".to_string(),
            quantity: "1".to_string(),
            unit: None,
            unit_override: None,
        });
        assert_eq!(recipe.ingredient_summary(), "1 ingredient");
    }
}
