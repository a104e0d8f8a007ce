use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::AppResult;
use super::{AppState, AuthUser};
use crate::db::{DeductionReport, PantryRepository, RecipeRepository};
use crate::matching::{match_recipe, rank_recipes, RecipeMatch};
use crate::models::{Ingredient, Recipe, RecipeSource, TimeCategory};
use crate::Error;

/// Loads a recipe the caller owns, or 404.
pub(super) async fn owned_recipe(state: &AppState, user_id: Uuid, id: Uuid) -> AppResult<Recipe> {
    Ok(RecipeRepository::new(state.pool.clone())
        .get_owned(user_id, id)
        .await?
        .ok_or_else(|| Error::not_found("Recipe"))?)
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub time: Option<TimeCategory>,
    /// Order by how much of each recipe the pantry covers
    #[serde(default)]
    pub ranked: bool,
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum RecipeList {
    Plain(Vec<Recipe>),
    Ranked(Vec<RankedEntry>),
}

#[derive(Serialize)]
pub struct RankedEntry {
    pub recipe: Recipe,
    #[serde(rename = "match")]
    pub matched: RecipeMatch,
}

pub async fn list(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<RecipeList>> {
    let mut recipes = RecipeRepository::new(state.pool.clone())
        .list(user.id)
        .await?;
    if let Some(time) = query.time {
        recipes.retain(|r| r.time_category() == Some(time));
    }

    if !query.ranked {
        return Ok(Json(RecipeList::Plain(recipes)));
    }

    let pantry = PantryRepository::new(state.pool.clone())
        .list(user.id)
        .await?;
    let ranked = rank_recipes(&recipes, &pantry)
        .into_iter()
        .map(|entry| RankedEntry {
            recipe: entry.recipe.clone(),
            matched: entry.matched,
        })
        .collect();
    Ok(Json(RecipeList::Ranked(ranked)))
}

#[derive(Debug, Deserialize)]
pub struct RecipeInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub instructions: Vec<String>,
    pub prep_time: Option<i32>,
    pub cook_time: Option<i32>,
    pub servings: Option<i32>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub image_url: Option<String>,
}

impl RecipeInput {
    fn into_recipe(self, user_id: Uuid) -> crate::Result<Recipe> {
        if self.title.trim().is_empty() {
            return Err(Error::validation("Recipe title must not be empty"));
        }
        if let Some(bad) = self
            .ingredients
            .iter()
            .find(|i| i.name.trim().is_empty() || !i.quantity.is_finite() || i.quantity < 0.0)
        {
            return Err(Error::validation(format!("Invalid ingredient '{}'", bad)));
        }
        for (label, minutes) in [
            ("prep_time", self.prep_time),
            ("cook_time", self.cook_time),
            ("servings", self.servings),
        ] {
            if minutes.is_some_and(|m| m < 0) {
                return Err(Error::validation(format!("{} must not be negative", label)));
            }
        }

        let mut recipe = Recipe::new(self.title.trim(), user_id)
            .with_description(self.description)
            .with_ingredients(self.ingredients)
            .with_instructions(self.instructions)
            .with_tags(self.tags)
            .with_source(RecipeSource::Manual);
        recipe.prep_time = self.prep_time;
        recipe.cook_time = self.cook_time;
        recipe.servings = self.servings;
        recipe.image_url = self.image_url;
        Ok(recipe)
    }
}

pub async fn create(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(input): Json<RecipeInput>,
) -> AppResult<(StatusCode, Json<Recipe>)> {
    let recipe = input.into_recipe(user.id)?;
    let created = RecipeRepository::new(state.pool.clone())
        .create(&recipe)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Recipe>> {
    Ok(Json(owned_recipe(&state, user.id, id).await?))
}

#[derive(Serialize)]
pub struct DeleteResponse {
    deleted: bool,
    shared_copies_removed: u64,
}

pub async fn remove(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DeleteResponse>> {
    let removed = RecipeRepository::new(state.pool.clone())
        .delete(user.id, id)
        .await?
        .ok_or_else(|| Error::not_found("Recipe"))?;
    Ok(Json(DeleteResponse {
        deleted: true,
        shared_copies_removed: removed,
    }))
}

pub async fn match_pantry(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RecipeMatch>> {
    let recipe = owned_recipe(&state, user.id, id).await?;
    let pantry = PantryRepository::new(state.pool.clone())
        .list(user.id)
        .await?;
    Ok(Json(match_recipe(&recipe.ingredients, &pantry)))
}

/// Deducts the recipe's ingredients from the pantry.
pub async fn cook(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DeductionReport>> {
    let recipe = owned_recipe(&state, user.id, id).await?;
    let report = PantryRepository::new(state.pool.clone())
        .deduct_for_recipe(user.id, &recipe.ingredients)
        .await?;
    Ok(Json(report))
}
