use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::AppResult;
use super::recipes::owned_recipe;
use super::{AppState, AuthUser};
use crate::db::{
    CommentRepository, FeedQuery, RatingRepository, ReportRepository, SharedRecipeRepository,
};
use crate::models::{Comment, Rating, RatingSummary, Report, ReportCategory, SharedRecipe};
use crate::Error;

/// Posts one of the caller's recipes to the community feed.
pub async fn share(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<SharedRecipe>)> {
    let recipe = owned_recipe(&state, user.id, id).await?;
    let shared = SharedRecipeRepository::new(state.pool.clone())
        .share(&recipe, &user.display_name)
        .await?;
    Ok((StatusCode::CREATED, Json(shared)))
}

pub async fn feed(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> AppResult<Json<Vec<SharedRecipe>>> {
    let recipes = SharedRecipeRepository::new(state.pool.clone())
        .feed(&query)
        .await?;
    Ok(Json(recipes))
}

pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SharedRecipe>> {
    let shared = SharedRecipeRepository::new(state.pool.clone())
        .get(id)
        .await?
        .ok_or_else(|| Error::not_found("Shared recipe"))?;
    Ok(Json(shared))
}

pub async fn unshare(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    SharedRecipeRepository::new(state.pool.clone())
        .delete(user.id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// Ratings

#[derive(Debug, Deserialize)]
pub struct RatingInput {
    pub score: i32,
    pub review: Option<String>,
}

pub async fn list_ratings(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<Rating>>> {
    Ok(Json(RatingRepository::new(state.pool.clone()).list(id).await?))
}

/// Creates or replaces the caller's rating; returns the new aggregate.
pub async fn rate(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(input): Json<RatingInput>,
) -> AppResult<Json<RatingSummary>> {
    let summary = RatingRepository::new(state.pool.clone())
        .submit(id, user.id, input.score, input.review.as_deref())
        .await?;
    Ok(Json(summary))
}

pub async fn remove_rating(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RatingSummary>> {
    let summary = RatingRepository::new(state.pool.clone())
        .remove(id, user.id)
        .await?;
    Ok(Json(summary))
}

// Comments

#[derive(Debug, Deserialize)]
pub struct CommentInput {
    pub body: String,
}

pub async fn list_comments(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<Comment>>> {
    Ok(Json(CommentRepository::new(state.pool.clone()).list(id).await?))
}

pub async fn add_comment(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(input): Json<CommentInput>,
) -> AppResult<(StatusCode, Json<Comment>)> {
    let comment = CommentRepository::new(state.pool.clone())
        .add(id, user.id, &user.display_name, &input.body)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path((id, comment_id)): Path<(Uuid, Uuid)>,
) -> AppResult<StatusCode> {
    CommentRepository::new(state.pool.clone())
        .delete(id, comment_id, user.id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// Reports

#[derive(Debug, Deserialize)]
pub struct ReportInput {
    pub category: ReportCategory,
    pub message: String,
    pub shared_recipe_id: Option<Uuid>,
}

#[derive(Serialize)]
pub struct ReportResponse {
    id: Uuid,
    status: &'static str,
}

pub async fn file_report(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(input): Json<ReportInput>,
) -> AppResult<(StatusCode, Json<ReportResponse>)> {
    let message = input.message.trim();
    if message.is_empty() {
        return Err(Error::validation("Report message must not be empty").into());
    }

    let mut report = Report::new(user.id, input.category, message);
    report.shared_recipe_id = input.shared_recipe_id;
    ReportRepository::new(state.pool.clone())
        .create(&report)
        .await?;

    tracing::info!(report_id = %report.id, category = %report.category, "report filed");
    Ok((
        StatusCode::CREATED,
        Json(ReportResponse {
            id: report.id,
            status: "received",
        }),
    ))
}
