//! Endpoints backed by the completion API.
//!
//! Each handler builds a prompt from the caller's pantry and dietary
//! preferences, sends it to the configured [`CompletionProvider`] and parses
//! the JSON answer. A malformed answer is a 502; no provider is a 503.
//!
//! [`CompletionProvider`]: crate::llm::CompletionProvider

use axum::{extract::State, Extension, Json};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::AppResult;
use super::recipes::owned_recipe;
use super::{AppState, AuthUser};
use crate::db::{PantryRepository, RecipeRepository};
use crate::llm::parse::{
    parse_alternatives, parse_detected_ingredients, parse_generated_recipes, parse_substitutes,
};
use crate::llm::prompts::{self, GenerationOptions};
use crate::llm::{Alternative, DetectedIngredient, ImageInput, Substitute};
use crate::matching::{match_recipe, RecipeMatch};
use crate::models::{Ingredient, PantryItem, Recipe};
use crate::storage::ImageStore;
use crate::Error;

/// Most recipes a single generation request may ask for.
const MAX_GENERATED: u8 = 5;

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub count: Option<u8>,
    pub cuisine: Option<String>,
    pub max_minutes: Option<u32>,
    pub notes: Option<String>,
    /// Cook from these instead of the stored pantry
    pub ingredients: Option<Vec<Ingredient>>,
    /// Store the results as personal recipes
    #[serde(default = "default_true")]
    pub save: bool,
}

#[derive(Serialize)]
pub struct GeneratedEntry {
    pub recipe: Recipe,
    #[serde(rename = "match")]
    pub matched: RecipeMatch,
}

#[derive(Serialize)]
pub struct GenerateResponse {
    pub recipes: Vec<GeneratedEntry>,
    pub saved: bool,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub async fn generate_recipe(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(request): Json<GenerateRequest>,
) -> AppResult<Json<GenerateResponse>> {
    let provider = state.llm()?;
    let pantry = PantryRepository::new(state.pool.clone())
        .list(user.id)
        .await?;

    let inventory = match request.ingredients {
        Some(given) if !given.is_empty() => given,
        _ => prompts::pantry_as_ingredients(&pantry),
    };
    if inventory.is_empty() {
        return Err(Error::validation(
            "No ingredients to cook from. Add pantry items or pass ingredients.",
        )
        .into());
    }

    let options = GenerationOptions {
        count: request.count.unwrap_or(1).clamp(1, MAX_GENERATED),
        cuisine: non_blank(request.cuisine),
        max_minutes: request.max_minutes,
        notes: non_blank(request.notes),
    };
    let completion = provider
        .complete(&prompts::recipe_generation(
            &inventory,
            &user.preferences,
            &options,
        ))
        .await?;
    let generated = parse_generated_recipes(&completion)?;

    let mut generated: Vec<Recipe> = generated
        .into_iter()
        .map(|candidate| candidate.into_recipe(user.id))
        .collect();
    if request.save {
        generated = RecipeRepository::new(state.pool.clone())
            .create_many(&generated)
            .await?;
    }
    let recipes: Vec<GeneratedEntry> = generated
        .into_iter()
        .map(|recipe| {
            let matched = match_recipe(&recipe.ingredients, &pantry);
            GeneratedEntry { recipe, matched }
        })
        .collect();

    tracing::info!(user_id = %user.id, count = recipes.len(), saved = request.save, "generated recipes");
    Ok(Json(GenerateResponse {
        recipes,
        saved: request.save,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SubstitutesRequest {
    pub ingredient: String,
    pub recipe_id: Option<Uuid>,
}

#[derive(Serialize)]
pub struct SubstitutesResponse {
    pub ingredient: String,
    pub substitutes: Vec<Substitute>,
}

pub async fn suggest_substitutes(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(request): Json<SubstitutesRequest>,
) -> AppResult<Json<SubstitutesResponse>> {
    let ingredient = request.ingredient.trim().to_string();
    if ingredient.is_empty() {
        return Err(Error::validation("Ingredient must not be empty").into());
    }
    let provider = state.llm()?;

    let title = match request.recipe_id {
        Some(id) => Some(owned_recipe(&state, user.id, id).await?.title),
        None => None,
    };
    let pantry = PantryRepository::new(state.pool.clone())
        .list(user.id)
        .await?;

    let completion = provider
        .complete(&prompts::ingredient_substitutes(
            &ingredient,
            title.as_deref(),
            &pantry,
            &user.preferences,
        ))
        .await?;
    Ok(Json(SubstitutesResponse {
        ingredient,
        substitutes: parse_substitutes(&completion)?,
    }))
}

#[derive(Debug, Deserialize)]
pub struct AlternativesRequest {
    pub recipe_id: Uuid,
}

#[derive(Serialize)]
pub struct AlternativesResponse {
    pub recipe_id: Uuid,
    /// Ingredients the pantry lacks or has too little of
    pub missing: Vec<Ingredient>,
    pub alternatives: Vec<Alternative>,
}

pub async fn suggest_alternatives(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(request): Json<AlternativesRequest>,
) -> AppResult<Json<AlternativesResponse>> {
    let recipe = owned_recipe(&state, user.id, request.recipe_id).await?;
    let pantry = PantryRepository::new(state.pool.clone())
        .list(user.id)
        .await?;

    let matched = match_recipe(&recipe.ingredients, &pantry);
    let mut missing = matched.missing;
    missing.extend(matched.partial.into_iter().map(|p| p.ingredient));

    if missing.is_empty() {
        return Ok(Json(AlternativesResponse {
            recipe_id: recipe.id,
            missing,
            alternatives: Vec::new(),
        }));
    }

    let completion = state
        .llm()?
        .complete(&prompts::missing_alternatives(
            &recipe.title,
            &missing,
            &pantry,
            &user.preferences,
        ))
        .await?;
    Ok(Json(AlternativesResponse {
        recipe_id: recipe.id,
        missing,
        alternatives: parse_alternatives(&completion)?,
    }))
}

#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    pub mime_type: String,
    /// Base64 bytes, with or without a `data:` URL prefix
    pub data: String,
    #[serde(default)]
    pub add_to_pantry: bool,
}

#[derive(Serialize)]
pub struct UploadedImage {
    pub key: String,
    pub mime_type: String,
    pub size: usize,
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub image: UploadedImage,
    pub ingredients: Vec<DetectedIngredient>,
    pub added: Vec<PantryItem>,
}

/// Stores an ingredient photo, asks the model what is in it and optionally
/// stocks the pantry with the result.
pub async fn upload_ingredient_image(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(request): Json<UploadRequest>,
) -> AppResult<Json<UploadResponse>> {
    let provider = state.llm()?;

    ImageStore::extension_for(&request.mime_type)?;
    let bytes = state.images.decode(&request.data)?;

    // Only keep the file once the model has read it
    let completion = provider
        .complete(&prompts::ingredient_detection(ImageInput {
            mime_type: request.mime_type.clone(),
            base64_data: STANDARD.encode(&bytes),
        }))
        .await?;
    let ingredients = parse_detected_ingredients(&completion)?;
    let stored = state
        .images
        .save(&user.id.to_string(), &request.mime_type, &bytes)?;

    let mut added = Vec::new();
    if request.add_to_pantry {
        let repo = PantryRepository::new(state.pool.clone());
        for detected in &ingredients {
            added.push(
                repo.add(user.id, &detected.name, detected.quantity, &detected.unit)
                    .await?,
            );
        }
    }

    tracing::info!(
        user_id = %user.id,
        key = %stored.key,
        detected = ingredients.len(),
        added = added.len(),
        "processed ingredient image"
    );
    Ok(Json(UploadResponse {
        image: UploadedImage {
            key: stored.key,
            mime_type: stored.mime_type,
            size: stored.size,
        },
        ingredients,
        added,
    }))
}
