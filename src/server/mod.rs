//! HTTP API for PantryChef.
//!
//! `GET /health` is public; every other route needs
//! `Authorization: Bearer <token>` with a key issued by `pantrychef-admin`.

mod ai;
mod auth;
mod browse;
mod community;
pub mod error;
mod inventory;
mod profile;
mod recipes;

pub use auth::AuthUser;
pub use error::{AppError, AppResult};

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Serialize;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::llm::{CompletionProvider, LlmError};
use crate::mealdb::MealDbClient;
use crate::storage::ImageStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    /// `None` when no completion API key is configured
    pub llm: Option<Arc<dyn CompletionProvider>>,
    pub images: ImageStore,
    pub mealdb: MealDbClient,
}

impl AppState {
    pub fn llm(&self) -> Result<&dyn CompletionProvider, LlmError> {
        self.llm.as_deref().ok_or(LlmError::NotConfigured)
    }
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Health check endpoint (no auth required)
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    // Public routes (no auth)
    let public_routes = Router::new().route("/health", get(health));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/me", get(profile::me))
        .route(
            "/api/profile",
            get(profile::get_profile).put(profile::update_profile),
        )
        .route("/api/inventory", get(inventory::list).post(inventory::add))
        .route(
            "/api/inventory/{id}",
            put(inventory::update).delete(inventory::remove),
        )
        .route("/api/convert", get(inventory::convert))
        .route("/api/recipes", get(recipes::list).post(recipes::create))
        .route(
            "/api/recipes/{id}",
            get(recipes::show).delete(recipes::remove),
        )
        .route("/api/recipes/{id}/match", get(recipes::match_pantry))
        .route("/api/recipes/{id}/cook", post(recipes::cook))
        .route("/api/recipes/{id}/share", post(community::share))
        .route("/api/feed", get(community::feed))
        .route(
            "/api/shared/{id}",
            get(community::show).delete(community::unshare),
        )
        .route(
            "/api/shared/{id}/ratings",
            get(community::list_ratings)
                .post(community::rate)
                .delete(community::remove_rating),
        )
        .route(
            "/api/shared/{id}/comments",
            get(community::list_comments).post(community::add_comment),
        )
        .route(
            "/api/shared/{id}/comments/{comment_id}",
            delete(community::delete_comment),
        )
        .route("/api/reports", post(community::file_report))
        .route("/api/browse", get(browse::search))
        .route("/api/browse/{meal_id}/import", post(browse::import))
        .route("/api/generate-recipe", post(ai::generate_recipe))
        .route(
            "/api/suggest-ingredient-substitutes",
            post(ai::suggest_substitutes),
        )
        .route("/api/suggest-alternatives", post(ai::suggest_alternatives))
        .route(
            "/api/upload-ingredient-image",
            post(ai::upload_ingredient_image),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    // Base64 inflates uploads by a third; leave room for the JSON around it
    let body_limit = state.images.max_bytes() / 3 * 4 + 64 * 1024;

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
