//! REST surface over the store
//!
//! All routes live under `/api`. Errors are JSON objects of the form
//! `{"error": "<message>"}`.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::API_BASE;
use crate::error::StoreError;
use crate::model::{IngredientInput, RecipeInput};
use crate::store::RecipeStore;

type SharedStore = Arc<Mutex<RecipeStore>>;

type ApiResult<T> = Result<T, ApiError>;

/// Errors a handler can answer with
#[derive(Debug)]
pub enum ApiError {
    NotFound,
    MethodNotAllowed,
    BadRequest(String),
    Store(StoreError),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
            ApiError::MethodNotAllowed => (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".to_string()),
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Store(err) if err.is_client_error() => (StatusCode::BAD_REQUEST, err.to_string()),
            ApiError::Store(err) => {
                error!(error = %err, "Store failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Build the application router around a store
pub fn router(store: RecipeStore) -> Router {
    let state: SharedStore = Arc::new(Mutex::new(store));

    let api = Router::new()
        .route("/ingredients", get(list_ingredients).post(create_ingredient))
        .route(
            "/ingredients/:id",
            get(get_ingredient).patch(update_ingredient).delete(delete_ingredient),
        )
        .route("/recipes", get(list_recipes).post(create_recipe))
        .route(
            "/recipes/:id",
            get(get_recipe).patch(update_recipe).delete(delete_recipe),
        )
        .method_not_allowed_fallback(method_not_allowed)
        .with_state(state);

    Router::new().nest(API_BASE, api).fallback(not_found)
}

/// Serve the API on an already-bound listener until Ctrl+C
pub async fn serve(listener: TcpListener, store: RecipeStore) -> eyre::Result<()> {
    let addr = listener.local_addr()?;
    info!(%addr, "Serving recipe API");

    axum::serve(listener, router(store))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
        })
        .await?;

    info!("Recipe API stopped");
    Ok(())
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// Non-numeric ids cannot name a row, so they are treated as missing
fn parse_id(raw: &str) -> ApiResult<i64> {
    raw.parse().map_err(|_| ApiError::NotFound)
}

/// Decode a JSON body; an empty body decodes as an empty object
fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> ApiResult<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e)))
}

// === Ingredients ===

async fn list_ingredients(State(store): State<SharedStore>) -> ApiResult<Response> {
    let ingredients = store.lock().await.list_ingredients()?;
    Ok(Json(ingredients).into_response())
}

async fn get_ingredient(State(store): State<SharedStore>, Path(id): Path<String>) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    let ingredient = store.lock().await.get_ingredient(id)?.ok_or(ApiError::NotFound)?;
    Ok(Json(ingredient).into_response())
}

async fn create_ingredient(State(store): State<SharedStore>, body: Bytes) -> ApiResult<Response> {
    let input: IngredientInput = parse_body(&body)?;
    debug!(?input, "create_ingredient: request");
    let ingredient = store.lock().await.create_ingredient(&input)?;
    Ok((StatusCode::CREATED, Json(ingredient)).into_response())
}

async fn update_ingredient(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    let input: IngredientInput = parse_body(&body)?;
    let ingredient = store
        .lock()
        .await
        .update_ingredient(id, &input)?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(ingredient).into_response())
}

async fn delete_ingredient(State(store): State<SharedStore>, Path(id): Path<String>) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    if !store.lock().await.delete_ingredient(id)? {
        return Err(ApiError::NotFound);
    }
    Ok(StatusCode::NO_CONTENT.into_response())
}

// === Recipes ===

async fn list_recipes(State(store): State<SharedStore>) -> ApiResult<Response> {
    let recipes = store.lock().await.list_recipes()?;
    Ok(Json(recipes).into_response())
}

async fn get_recipe(State(store): State<SharedStore>, Path(id): Path<String>) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    let recipe = store.lock().await.get_recipe(id)?.ok_or(ApiError::NotFound)?;
    Ok(Json(recipe).into_response())
}

async fn create_recipe(State(store): State<SharedStore>, body: Bytes) -> ApiResult<Response> {
    let input: RecipeInput = parse_body(&body)?;
    debug!(?input, "create_recipe: request");
    let recipe = store.lock().await.create_recipe(&input)?;
    Ok((StatusCode::CREATED, Json(recipe)).into_response())
}

async fn update_recipe(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    let input: RecipeInput = parse_body(&body)?;
    let recipe = store
        .lock()
        .await
        .update_recipe(id, &input)?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(recipe).into_response())
}

async fn delete_recipe(State(store): State<SharedStore>, Path(id): Path<String>) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    if !store.lock().await.delete_recipe(id)? {
        return Err(ApiError::NotFound);
    }
    Ok(StatusCode::NO_CONTENT.into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    async fn spawn_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(RecipeStore::open_in_memory().unwrap());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/api", addr)
    }

    #[tokio::test]
    async fn test_create_then_fetch_ingredient() {
        let base = spawn_server().await;
        let client = reqwest::Client::new();

        let resp = client
            .post(format!("{}/ingredients", base))
            .json(&json!({"name": "Flour", "unit": "g"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
        let created: Value = resp.json().await.unwrap();
        let id = created["id"].as_i64().unwrap();

        let fetched: Value = client
            .get(format!("{}/ingredients/{}", base, id))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(fetched["name"], "Flour");
        assert_eq!(fetched["unit"], "g");
    }

    #[tokio::test]
    async fn test_missing_rows_are_404() {
        let base = spawn_server().await;
        let client = reqwest::Client::new();

        for path in ["recipes/999", "ingredients/999", "recipes/abc", "nowhere"] {
            let resp = client.get(format!("{}/{}", base, path)).send().await.unwrap();
            assert_eq!(resp.status(), 404, "path {}", path);
            let body: Value = resp.json().await.unwrap();
            assert_eq!(body["error"], "Not found");
        }

        let resp = client.delete(format!("{}/recipes/999", base)).send().await.unwrap();
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn test_wrong_method_is_405_with_message() {
        let base = spawn_server().await;
        let client = reqwest::Client::new();

        for path in ["recipes/1", "ingredients"] {
            let resp = client.put(format!("{}/{}", base, path)).send().await.unwrap();
            assert_eq!(resp.status(), 405, "path {}", path);
            let body: Value = resp.json().await.unwrap();
            assert_eq!(body["error"], "Method not allowed");
        }
    }

    #[tokio::test]
    async fn test_bad_input_is_400_with_message() {
        let base = spawn_server().await;
        let client = reqwest::Client::new();

        let resp = client
            .post(format!("{}/recipes", base))
            .json(&json!({"name": "Bad", "ingredients": [{"ingredient_id": 99999, "quantity": "1"}]}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "Ingredient id 99999 not found");

        let resp = client
            .post(format!("{}/ingredients", base))
            .header("content-type", "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
    }

    #[tokio::test]
    async fn test_empty_body_is_empty_object() {
        let base = spawn_server().await;
        let client = reqwest::Client::new();

        let resp = client.post(format!("{}/recipes", base)).send().await.unwrap();
        assert_eq!(resp.status(), 400);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "name: Missing data for required field.");
    }

    #[tokio::test]
    async fn test_delete_returns_204_with_empty_body() {
        let base = spawn_server().await;
        let client = reqwest::Client::new();

        let created: Value = client
            .post(format!("{}/recipes", base))
            .json(&json!({"name": "Toast"}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let id = created["id"].as_i64().unwrap();

        let resp = client
            .delete(format!("{}/recipes/{}", base, id))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 204);
        assert!(resp.text().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_in_use_ingredient_delete_is_400() {
        let base = spawn_server().await;
        let client = reqwest::Client::new();

        let flour: Value = client
            .post(format!("{}/ingredients", base))
            .json(&json!({"name": "Flour", "unit": "g"}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let flour_id = flour["id"].as_i64().unwrap();

        client
            .post(format!("{}/recipes", base))
            .json(&json!({"name": "Bread", "ingredients": [{"ingredient_id": flour_id, "quantity": "500"}]}))
            .send()
            .await
            .unwrap();

        let resp = client
            .delete(format!("{}/ingredients/{}", base, flour_id))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "Cannot delete ingredient that is used in recipes");
    }
}
