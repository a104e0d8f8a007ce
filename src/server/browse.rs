use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use super::error::{AppError, AppResult};
use super::{AppState, AuthUser};
use crate::db::RecipeRepository;
use crate::mealdb::{Meal, MealSummary};
use crate::models::Recipe;
use crate::Error;

#[derive(Debug, Default, Deserialize)]
pub struct BrowseQuery {
    /// Meal name to search for
    pub q: Option<String>,
    /// Main ingredient to filter by
    pub ingredient: Option<String>,
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum BrowseResults {
    Meals(Vec<Meal>),
    Summaries(Vec<MealSummary>),
}

/// Searches the public meal database. Upstream failures yield an empty list.
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<BrowseQuery>,
) -> AppResult<Json<BrowseResults>> {
    let q = query.q.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let ingredient = query
        .ingredient
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    match (q, ingredient) {
        (Some(q), _) => Ok(Json(BrowseResults::Meals(
            state.mealdb.search_or_empty(q).await,
        ))),
        (None, Some(ingredient)) => Ok(Json(BrowseResults::Summaries(
            state.mealdb.filter_or_empty(ingredient).await,
        ))),
        (None, None) => Err(AppError::BadRequest(
            "Provide either q or ingredient".to_string(),
        )),
    }
}

/// Copies a meal from the public database into the caller's recipes.
pub async fn import(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(meal_id): Path<String>,
) -> AppResult<(StatusCode, Json<Recipe>)> {
    let meal = state
        .mealdb
        .lookup(&meal_id)
        .await?
        .ok_or_else(|| Error::not_found("Meal"))?;

    let recipe = meal.into_recipe(user.id);
    let created = RecipeRepository::new(state.pool.clone())
        .create(&recipe)
        .await?;
    tracing::info!(%meal_id, recipe_id = %created.id, "imported meal");
    Ok((StatusCode::CREATED, Json(created)))
}

#[cfg(test)]
mod tests {
    use crate::llm::testing::MockProvider;
    use crate::server::testing::test_app;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_search_falls_back_to_empty() {
        let app = test_app(MockProvider::default()).await;

        let (status, body) = app.call("GET", "/api/browse?q=chicken", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));

        let (status, body) = app
            .call("GET", "/api/browse?ingredient=chicken%20breast", None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_search_needs_a_term() {
        let app = test_app(MockProvider::default()).await;
        let (status, body) = app.call("GET", "/api/browse?q=%20", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bad_request");
    }

    #[tokio::test]
    async fn test_import_reports_upstream_failure() {
        let app = test_app(MockProvider::default()).await;
        let (status, body) = app.call("POST", "/api/browse/52772/import", None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "upstream_error");

        let (_, recipes) = app.call("GET", "/api/recipes", None).await;
        assert!(recipes.as_array().unwrap().is_empty());
    }
}
