//! reqwest implementation of RecipeApi

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::RecipeApi;
use crate::config::ApiConfig;
use crate::domain::{Ingredient, IngredientPayload, Recipe, RecipePayload};
use crate::error::RecipeError;

/// HTTP client for the `/api` routes
pub struct HttpApiClient {
    base_url: String,
    http: Client,
}

impl HttpApiClient {
    /// Create a client for a server root such as `http://127.0.0.1:5001`
    ///
    /// A trailing `/api` on the root is accepted and not doubled.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RecipeError> {
        debug!(%base_url, ?timeout, "HttpApiClient::new: called");
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: api_root(base_url),
            http,
        })
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self, RecipeError> {
        Self::new(&config.base_url, Duration::from_millis(config.timeout_ms))
    }

    /// Root all paths are joined to, ending in `/api`
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue a request; `Ok(None)` for an empty success body
    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<Option<Value>, RecipeError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "HttpApiClient::send: called");

        let mut request = self
            .http
            .request(method.clone(), &url)
            .header("content-type", "application/json");
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(|e| {
            warn!(%method, %url, error = %e, "Request failed");
            RecipeError::Network(e.to_string())
        })?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = failure_message(status, &text);
            debug!(%status, %message, "HttpApiClient::send: non-success status");
            return Err(RecipeError::Request {
                status: status.as_u16(),
                message,
            });
        }

        decode_body(&text)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, RecipeError> {
        let value = self
            .send(method, path, body)
            .await?
            .ok_or_else(|| RecipeError::Decode("empty response body".to_string()))?;
        Ok(serde_json::from_value(value)?)
    }
}

fn api_root(base_url: &str) -> String {
    let root = base_url.trim().trim_end_matches('/');
    if root.ends_with("/api") {
        root.to_string()
    } else {
        format!("{}/api", root)
    }
}

/// Message for a failed response: the body's `error` field, else the status text
pub(crate) fn failure_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string())
}

/// Empty bodies decode to an absent value rather than JSON
fn decode_body(text: &str) -> Result<Option<Value>, RecipeError> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(text)?))
}

fn to_value<T: serde::Serialize>(payload: &T) -> Result<Value, RecipeError> {
    serde_json::to_value(payload).map_err(|e| RecipeError::Decode(e.to_string()))
}

#[async_trait]
impl RecipeApi for HttpApiClient {
    async fn list_recipes(&self) -> Result<Vec<Recipe>, RecipeError> {
        self.fetch(Method::GET, "/recipes", None).await
    }

    async fn get_recipe(&self, id: i64) -> Result<Recipe, RecipeError> {
        self.fetch(Method::GET, &format!("/recipes/{}", id), None).await
    }

    async fn create_recipe(&self, payload: &RecipePayload) -> Result<Recipe, RecipeError> {
        self.fetch(Method::POST, "/recipes", Some(to_value(payload)?)).await
    }

    async fn update_recipe(&self, id: i64, payload: &RecipePayload) -> Result<Recipe, RecipeError> {
        self.fetch(Method::PATCH, &format!("/recipes/{}", id), Some(to_value(payload)?))
            .await
    }

    async fn delete_recipe(&self, id: i64) -> Result<(), RecipeError> {
        self.send(Method::DELETE, &format!("/recipes/{}", id), None).await?;
        Ok(())
    }

    async fn list_ingredients(&self) -> Result<Vec<Ingredient>, RecipeError> {
        self.fetch(Method::GET, "/ingredients", None).await
    }

    async fn get_ingredient(&self, id: i64) -> Result<Ingredient, RecipeError> {
        self.fetch(Method::GET, &format!("/ingredients/{}", id), None).await
    }

    async fn create_ingredient(&self, payload: &IngredientPayload) -> Result<Ingredient, RecipeError> {
        self.fetch(Method::POST, "/ingredients", Some(to_value(payload)?)).await
    }

    async fn update_ingredient(&self, id: i64, payload: &IngredientPayload) -> Result<Ingredient, RecipeError> {
        self.fetch(Method::PATCH, &format!("/ingredients/{}", id), Some(to_value(payload)?))
            .await
    }

    async fn delete_ingredient(&self, id: i64) -> Result<(), RecipeError> {
        self.send(Method::DELETE, &format!("/ingredients/{}", id), None).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_root_normalization() {
        assert_eq!(api_root("http://localhost:5001"), "http://localhost:5001/api");
        assert_eq!(api_root("http://localhost:5001/"), "http://localhost:5001/api");
        assert_eq!(api_root("http://localhost:5001/api/"), "http://localhost:5001/api");
    }

    #[test]
    fn test_failure_message_prefers_error_field() {
        let msg = failure_message(StatusCode::BAD_REQUEST, r#"{"error": "Recipe name is required"}"#);
        assert_eq!(msg, "Recipe name is required");
    }

    #[test]
    fn test_failure_message_falls_back_to_status_text() {
        assert_eq!(failure_message(StatusCode::NOT_FOUND, ""), "Not Found");
        assert_eq!(failure_message(StatusCode::BAD_GATEWAY, "<html>oops</html>"), "Bad Gateway");
        assert_eq!(failure_message(StatusCode::BAD_REQUEST, r#"{"message": "x"}"#), "Bad Request");
    }

    #[test]
    fn test_decode_body() {
        assert_eq!(decode_body("").unwrap(), None);
        assert_eq!(decode_body("  \n").unwrap(), None);
        assert!(decode_body("[]").unwrap().is_some());
        assert!(matches!(decode_body("not json"), Err(RecipeError::Decode(_))));
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        // Port 9 (discard) on loopback is normally closed
        let client = HttpApiClient::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
        let err = client.list_recipes().await.unwrap_err();
        assert!(matches!(err, RecipeError::Network(_)), "got {:?}", err);
    }
}
