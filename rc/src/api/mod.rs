//! REST API access for recipes and ingredients
//!
//! `RecipeApi` is the seam the controller talks to; `HttpApiClient` is the
//! real implementation over reqwest.

pub mod client;
mod http;

pub use client::RecipeApi;
pub use http::HttpApiClient;
