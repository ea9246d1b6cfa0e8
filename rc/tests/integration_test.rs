//! End-to-end tests: controller and HTTP client against a live recipestore

use std::sync::Arc;
use std::time::Duration;

use recipes::controller::{AutoConfirm, Controller, Nav, RecipeFormTarget, View};
use recipes::forms::{FieldEdit, RecipeField};
use recipes::{HttpApiClient, IngredientPayload, RecipeApi, RecipeError, RecipeLinePayload, RecipePayload};
use recipestore::RecipeStore;
use tokio::net::TcpListener;

async fn spawn_store() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let store = RecipeStore::open_in_memory().unwrap();
    tokio::spawn(async move {
        let _ = recipestore::serve(listener, store).await;
    });
    format!("http://{}", addr)
}

async fn client() -> Arc<HttpApiClient> {
    let base = spawn_store().await;
    Arc::new(HttpApiClient::new(&base, Duration::from_secs(5)).unwrap())
}

fn ingredient(name: &str, unit: &str) -> IngredientPayload {
    IngredientPayload {
        name: name.to_string(),
        unit: unit.to_string(),
    }
}

async fn controller(api: &Arc<HttpApiClient>) -> Controller {
    let mut controller = Controller::new(api.clone(), Arc::new(AutoConfirm(true)));
    controller.start().await;
    controller
}

fn set(controller: &mut Controller, target: RecipeFormTarget, field: RecipeField, value: &str) {
    controller.edit_recipe_field(target, field, FieldEdit::Set(value.to_string()));
}

#[tokio::test]
async fn test_ingredient_crud_over_http() {
    let api = client().await;

    let flour = api.create_ingredient(&ingredient("Flour", "g")).await.unwrap();
    let salt = api.create_ingredient(&ingredient("Salt", "")).await.unwrap();
    assert_eq!(flour.unit.as_deref(), Some("g"));
    assert_eq!(salt.unit, None);

    let names: Vec<String> = api.list_ingredients().await.unwrap().into_iter().map(|i| i.name).collect();
    assert_eq!(names, vec!["Flour", "Salt"]);

    let err = api.create_ingredient(&ingredient("Flour", "kg")).await.unwrap_err();
    assert_eq!(
        err,
        RecipeError::Request {
            status: 400,
            message: "Ingredient 'Flour' already exists".to_string(),
        }
    );

    let renamed = api.update_ingredient(salt.id, &ingredient("Sea salt", "pinch")).await.unwrap();
    assert_eq!(renamed.name, "Sea salt");
    assert_eq!(api.get_ingredient(salt.id).await.unwrap().unit.as_deref(), Some("pinch"));

    api.delete_ingredient(salt.id).await.unwrap();
    assert!(api.get_ingredient(salt.id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_recipe_lines_resolve_effective_unit() {
    let api = client().await;
    let flour = api.create_ingredient(&ingredient("Flour", "g")).await.unwrap();
    let milk = api.create_ingredient(&ingredient("Milk", "ml")).await.unwrap();

    let recipe = api
        .create_recipe(&RecipePayload {
            name: "Pancakes".to_string(),
            instructions: "Mix and fry".to_string(),
            ingredients: vec![
                RecipeLinePayload {
                    ingredient_id: flour.id,
                    quantity: "200".to_string(),
                    unit_override: None,
                },
                RecipeLinePayload {
                    ingredient_id: milk.id,
                    quantity: "1".to_string(),
                    unit_override: Some("cup".to_string()),
                },
            ],
        })
        .await
        .unwrap();

    assert!(recipe.created_at.is_some());
    let fetched = api.get_recipe(recipe.id).await.unwrap();
    assert_eq!(fetched.ingredients.len(), 2);
    let units: Vec<Option<&str>> = fetched.ingredients.iter().map(|l| l.effective_unit()).collect();
    assert_eq!(units, vec![Some("g"), Some("cup")]);
    assert_eq!(fetched.ingredients[1].unit_override.as_deref(), Some("cup"));
}

#[tokio::test]
async fn test_bread_line_joins_ingredient() {
    let api = client().await;
    let flour = api.create_ingredient(&ingredient("Flour", "g")).await.unwrap();
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

    let line = &api.get_recipe(bread.id).await.unwrap().ingredients[0];
    assert_eq!(line.ingredient_name, "Flour");
    assert_eq!(line.unit.as_deref(), Some("g"));
    assert_eq!(line.quantity, "500");

    // Full replace: the new list is exactly what comes back
    let replaced = api
        .update_recipe(
            bread.id,
            &RecipePayload {
                name: "Bread".to_string(),
                instructions: String::new(),
                ingredients: vec![],
            },
        )
        .await
        .unwrap();
    assert!(replaced.ingredients.is_empty());
    assert!(api.get_recipe(bread.id).await.unwrap().ingredients.is_empty());
}

#[tokio::test]
async fn test_add_recipe_flow_through_controller() {
    let api = client().await;
    let flour = api.create_ingredient(&ingredient("Flour", "g")).await.unwrap();
    let water = api.create_ingredient(&ingredient("Water", "ml")).await.unwrap();
    let mut controller = controller(&api).await;
    assert_eq!(controller.state().ingredients.len(), 2);

    controller.show(Nav::AddRecipe);
    set(&mut controller, RecipeFormTarget::Add, RecipeField::Name, "  Bread  ");
    set(&mut controller, RecipeFormTarget::Add, RecipeField::Ingredient(0), &flour.id.to_string());
    set(&mut controller, RecipeFormTarget::Add, RecipeField::Quantity(0), "500");
    controller.add_line(RecipeFormTarget::Add);
    set(&mut controller, RecipeFormTarget::Add, RecipeField::Ingredient(1), &water.id.to_string());
    set(&mut controller, RecipeFormTarget::Add, RecipeField::Quantity(1), "350");
    set(&mut controller, RecipeFormTarget::Add, RecipeField::UnitOverride(1), "g");
    // Incomplete trailing line is dropped
    controller.add_line(RecipeFormTarget::Add);

    assert!(controller.submit_recipe(RecipeFormTarget::Add).await.unwrap());
    let state = controller.state();
    assert_eq!(state.view, View::List);
    assert_eq!(state.recipes.len(), 1);
    assert_eq!(state.recipes[0].name, "Bread");
    assert_eq!(state.recipes[0].ingredient_count(), 2);
}

#[tokio::test]
async fn test_in_use_ingredient_cannot_be_deleted() {
    let api = client().await;
    let flour = api.create_ingredient(&ingredient("Flour", "g")).await.unwrap();
    api.create_recipe(&RecipePayload {
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

    let mut controller = controller(&api).await;
    controller.show(Nav::Ingredients);
    let err = controller.delete_ingredient(flour.id).await.unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert_eq!(
        controller.state().ingredients_view.error.as_deref(),
        Some("Cannot delete ingredient that is used in recipes")
    );
    assert_eq!(api.list_ingredients().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_edit_and_delete_recipe_through_controller() {
    let api = client().await;
    let flour = api.create_ingredient(&ingredient("Flour", "g")).await.unwrap();
    let recipe = api
        .create_recipe(&RecipePayload {
            name: "Dough".to_string(),
            instructions: String::new(),
            ingredients: vec![RecipeLinePayload {
                ingredient_id: flour.id,
                quantity: "500".to_string(),
                unit_override: Some("oz".to_string()),
            }],
        })
        .await
        .unwrap();

    let mut controller = controller(&api).await;
    assert!(controller.select_recipe(recipe.id).await);
    assert!(controller.begin_edit());
    let form = controller.state().detail.edit.clone().unwrap();
    assert_eq!(form.lines[0].unit_override, "oz");

    set(&mut controller, RecipeFormTarget::Edit, RecipeField::Instructions, "Knead");
    set(&mut controller, RecipeFormTarget::Edit, RecipeField::UnitOverride(0), "");
    assert!(controller.submit_recipe(RecipeFormTarget::Edit).await.unwrap());
    let updated = controller.state().detail.recipe.clone().unwrap();
    assert_eq!(updated.instructions, "Knead");
    assert_eq!(updated.ingredients[0].effective_unit(), Some("g"));

    assert!(controller.delete_recipe().await.unwrap());
    assert_eq!(controller.state().view, View::List);
    assert_eq!(controller.state().selected, None);
    assert!(controller.state().recipes.is_empty());
    assert!(api.get_recipe(recipe.id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_missing_recipe_detail_shows_error() {
    let api = client().await;
    let mut controller = controller(&api).await;
    assert!(controller.select_recipe(404).await);
    let detail = &controller.state().detail;
    assert!(detail.recipe.is_none());
    assert_eq!(detail.error.as_deref(), Some("Not found"));
}

#[tokio::test]
async fn test_unreachable_server_raises_banner() {
    let api = Arc::new(HttpApiClient::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap());
    let mut controller = Controller::new(api, Arc::new(AutoConfirm(true)));
    controller.start().await;

    let state = controller.state();
    assert_eq!(state.view, View::List);
    assert!(state.recipes.is_empty());
    assert!(state.ingredients.is_empty());
    assert!(state.banner.is_some());
}
