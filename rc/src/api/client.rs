//! RecipeApi trait definition

use async_trait::async_trait;

use crate::domain::{Ingredient, IngredientPayload, Recipe, RecipePayload};
use crate::error::RecipeError;

/// One operation per resource verb of the REST contract
///
/// Every call is independent; the client keeps no cache, so callers re-fetch
/// lists after a mutation.
#[async_trait]
pub trait RecipeApi: Send + Sync {
    async fn list_recipes(&self) -> Result<Vec<Recipe>, RecipeError>;

    async fn get_recipe(&self, id: i64) -> Result<Recipe, RecipeError>;

    async fn create_recipe(&self, payload: &RecipePayload) -> Result<Recipe, RecipeError>;

    /// Full replace of the line list
    async fn update_recipe(&self, id: i64, payload: &RecipePayload) -> Result<Recipe, RecipeError>;

    async fn delete_recipe(&self, id: i64) -> Result<(), RecipeError>;

    async fn list_ingredients(&self) -> Result<Vec<Ingredient>, RecipeError>;

    async fn get_ingredient(&self, id: i64) -> Result<Ingredient, RecipeError>;

    async fn create_ingredient(&self, payload: &IngredientPayload) -> Result<Ingredient, RecipeError>;

    async fn update_ingredient(&self, id: i64, payload: &IngredientPayload) -> Result<Ingredient, RecipeError>;

    /// Fails while any recipe references the ingredient
    async fn delete_ingredient(&self, id: i64) -> Result<(), RecipeError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use crate::domain::RecipeIngredient;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tracing::debug;

    #[derive(Default)]
    struct MockData {
        ingredients: Vec<Ingredient>,
        /// Newest first
        recipes: Vec<Recipe>,
        next_id: i64,
    }

    /// In-memory RecipeApi for unit tests
    ///
    /// Enforces the same integrity rules as the server and records every call.
    #[derive(Default)]
    pub struct MockRecipeApi {
        data: Mutex<MockData>,
        calls: Mutex<Vec<String>>,
        call_count: AtomicUsize,
        failures: Mutex<HashMap<String, RecipeError>>,
        delays: Mutex<HashMap<i64, Duration>>,
        list_delay: Mutex<Option<Duration>>,
    }

    fn not_found() -> RecipeError {
        RecipeError::Request {
            status: 404,
            message: "Not found".to_string(),
        }
    }

    fn bad_request(message: impl Into<String>) -> RecipeError {
        RecipeError::Request {
            status: 400,
            message: message.into(),
        }
    }

    impl MockRecipeApi {
        pub fn new() -> Self {
            debug!("MockRecipeApi::new: called");
            Self::default()
        }

        /// Seed an ingredient without recording a call
        pub fn add_ingredient(&self, name: &str, unit: &str) -> Ingredient {
            let mut data = self.data.lock().unwrap();
            data.next_id += 1;
            let ingredient = Ingredient {
                id: data.next_id,
                name: name.to_string(),
                unit: (!unit.is_empty()).then(|| unit.to_string()),
            };
            data.ingredients.push(ingredient.clone());
            data.ingredients.sort_by(|a, b| a.name.cmp(&b.name));
            ingredient
        }

        /// Seed a recipe without recording a call
        pub fn add_recipe(&self, name: &str, lines: &[(i64, &str)]) -> Recipe {
            let mut data = self.data.lock().unwrap();
            let lines = lines
                .iter()
                .map(|(id, qty)| join_line(&data, *id, qty, None).unwrap())
                .collect();
            data.next_id += 1;
            let recipe = Recipe {
                id: data.next_id,
                name: name.to_string(),
                instructions: String::new(),
                created_at: None,
                ingredients: lines,
            };
            data.recipes.insert(0, recipe.clone());
            recipe
        }

        /// Make the next call to `op` fail with `err`
        pub fn fail_next(&self, op: &str, err: RecipeError) {
            self.failures.lock().unwrap().insert(op.to_string(), err);
        }

        /// Delay `get_recipe(id)` responses
        pub fn delay_recipe(&self, id: i64, delay: Duration) {
            self.delays.lock().unwrap().insert(id, delay);
        }

        /// Delay every list call from now on
        pub fn delay_lists(&self, delay: Duration) {
            *self.list_delay.lock().unwrap() = Some(delay);
        }

        async fn list_pause(&self) {
            let delay = *self.list_delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
        }

        /// Every call made so far, e.g. `"delete_recipe(3)"`
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        pub fn recipe_ids(&self) -> Vec<i64> {
            self.data.lock().unwrap().recipes.iter().map(|r| r.id).collect()
        }

        pub fn ingredient_names(&self) -> Vec<String> {
            self.data
                .lock()
                .unwrap()
                .ingredients
                .iter()
                .map(|i| i.name.clone())
                .collect()
        }

        fn record(&self, op: &str, call: String) -> Result<(), RecipeError> {
            debug!(%call, "MockRecipeApi: call");
            self.call_count.fetch_add(1, Ordering::SeqCst);
            self.calls.lock().unwrap().push(call);
            match self.failures.lock().unwrap().remove(op) {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }
    }

    fn join_line(
        data: &MockData,
        ingredient_id: i64,
        quantity: &str,
        unit_override: Option<String>,
    ) -> Result<RecipeIngredient, RecipeError> {
        let ingredient = data
            .ingredients
            .iter()
            .find(|i| i.id == ingredient_id)
            .ok_or_else(|| bad_request(format!("Ingredient id {} not found", ingredient_id)))?;
        Ok(RecipeIngredient {
            ingredient_id,
            ingredient_name: ingredient.name.clone(),
            quantity: quantity.to_string(),
            unit: unit_override.clone().or_else(|| ingredient.unit.clone()),
            unit_override,
        })
    }

    fn build_recipe(data: &MockData, id: i64, payload: &RecipePayload) -> Result<Recipe, RecipeError> {
        let lines = payload
            .ingredients
            .iter()
            .map(|l| join_line(data, l.ingredient_id, &l.quantity, l.unit_override.clone()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Recipe {
            id,
            name: payload.name.clone(),
            instructions: payload.instructions.clone(),
            created_at: None,
            ingredients: lines,
        })
    }

    #[async_trait]
    impl RecipeApi for MockRecipeApi {
        async fn list_recipes(&self) -> Result<Vec<Recipe>, RecipeError> {
            self.record("list_recipes", "list_recipes".to_string())?;
            self.list_pause().await;
            Ok(self.data.lock().unwrap().recipes.clone())
        }

        async fn get_recipe(&self, id: i64) -> Result<Recipe, RecipeError> {
            self.record("get_recipe", format!("get_recipe({})", id))?;
            let delay = self.delays.lock().unwrap().get(&id).copied();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            let data = self.data.lock().unwrap();
            data.recipes.iter().find(|r| r.id == id).cloned().ok_or_else(not_found)
        }

        async fn create_recipe(&self, payload: &RecipePayload) -> Result<Recipe, RecipeError> {
            self.record("create_recipe", format!("create_recipe({})", payload.name))?;
            let mut data = self.data.lock().unwrap();
            let recipe = build_recipe(&data, data.next_id + 1, payload)?;
            data.next_id += 1;
            data.recipes.insert(0, recipe.clone());
            Ok(recipe)
        }

        async fn update_recipe(&self, id: i64, payload: &RecipePayload) -> Result<Recipe, RecipeError> {
            self.record("update_recipe", format!("update_recipe({})", id))?;
            let mut data = self.data.lock().unwrap();
            let pos = data.recipes.iter().position(|r| r.id == id).ok_or_else(not_found)?;
            let recipe = build_recipe(&data, id, payload)?;
            data.recipes[pos] = recipe.clone();
            Ok(recipe)
        }

        async fn delete_recipe(&self, id: i64) -> Result<(), RecipeError> {
            self.record("delete_recipe", format!("delete_recipe({})", id))?;
            let mut data = self.data.lock().unwrap();
            let pos = data.recipes.iter().position(|r| r.id == id).ok_or_else(not_found)?;
            data.recipes.remove(pos);
            Ok(())
        }

        async fn list_ingredients(&self) -> Result<Vec<Ingredient>, RecipeError> {
            self.record("list_ingredients", "list_ingredients".to_string())?;
            self.list_pause().await;
            Ok(self.data.lock().unwrap().ingredients.clone())
        }

        async fn get_ingredient(&self, id: i64) -> Result<Ingredient, RecipeError> {
            self.record("get_ingredient", format!("get_ingredient({})", id))?;
            let data = self.data.lock().unwrap();
            data.ingredients.iter().find(|i| i.id == id).cloned().ok_or_else(not_found)
        }

        async fn create_ingredient(&self, payload: &IngredientPayload) -> Result<Ingredient, RecipeError> {
            self.record("create_ingredient", format!("create_ingredient({})", payload.name))?;
            if self.data.lock().unwrap().ingredients.iter().any(|i| i.name == payload.name) {
                return Err(bad_request(format!("Ingredient '{}' already exists", payload.name)));
            }
            Ok(self.add_ingredient(&payload.name, &payload.unit))
        }

        async fn update_ingredient(&self, id: i64, payload: &IngredientPayload) -> Result<Ingredient, RecipeError> {
            self.record("update_ingredient", format!("update_ingredient({})", id))?;
            let mut data = self.data.lock().unwrap();
            if data.ingredients.iter().any(|i| i.name == payload.name && i.id != id) {
                return Err(bad_request(format!("Ingredient '{}' already exists", payload.name)));
            }
            let ingredient = data
                .ingredients
                .iter_mut()
                .find(|i| i.id == id)
                .ok_or_else(not_found)?;
            ingredient.name = payload.name.clone();
            ingredient.unit = (!payload.unit.is_empty()).then(|| payload.unit.clone());
            let updated = ingredient.clone();
            data.ingredients.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(updated)
        }

        async fn delete_ingredient(&self, id: i64) -> Result<(), RecipeError> {
            self.record("delete_ingredient", format!("delete_ingredient({})", id))?;
            let mut data = self.data.lock().unwrap();
            let pos = data.ingredients.iter().position(|i| i.id == id).ok_or_else(not_found)?;
            let in_use = data
                .recipes
                .iter()
                .any(|r| r.ingredients.iter().any(|l| l.ingredient_id == id));
            if in_use {
                return Err(bad_request("Cannot delete ingredient that is used in recipes"));
            }
            data.ingredients.remove(pos);
            Ok(())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::domain::RecipeLinePayload;

        #[tokio::test]
        async fn test_mock_joins_lines_and_guards_deletes() {
            let api = MockRecipeApi::new();
            let flour = api.add_ingredient("Flour", "g");
            let bread = api
                .create_recipe(&RecipePayload {
                    name: "Bread".to_string(),
                    instructions: String::new(),
                    ingredients: vec![RecipeLinePayload {
                        ingredient_id: flour.id,
                        quantity: "500".to_string(),
                        unit_override: None,
                    }],
                })
                .await
                .unwrap();
            assert_eq!(bread.ingredients[0].ingredient_name, "Flour");
            assert_eq!(bread.ingredients[0].unit.as_deref(), Some("g"));

            let err = api.delete_ingredient(flour.id).await.unwrap_err();
            assert_eq!(err.status(), Some(400));
            assert_eq!(api.ingredient_names(), vec!["Flour"]);
        }

        #[tokio::test]
        async fn test_fail_next_is_one_shot() {
            let api = MockRecipeApi::new();
            api.fail_next("list_recipes", RecipeError::Network("down".to_string()));
            assert!(api.list_recipes().await.is_err());
            assert!(api.list_recipes().await.is_ok());
            assert_eq!(api.call_count(), 2);
        }

        #[tokio::test]
        async fn test_unknown_recipe_is_404() {
            let api = MockRecipeApi::new();
            assert!(api.get_recipe(42).await.unwrap_err().is_not_found());
            assert_eq!(api.calls(), vec!["get_recipe(42)"]);
        }
    }
}
