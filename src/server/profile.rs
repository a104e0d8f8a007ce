use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};

use super::error::AppResult;
use super::{AppState, AuthUser};
use crate::db::UserRepository;
use crate::models::{DietaryPreferences, User};
use crate::Error;

/// Current user response
#[derive(Serialize)]
pub struct MeResponse {
    user_id: String,
    email: String,
    display_name: String,
}

/// Get current user info (auth required)
pub async fn me(Extension(AuthUser(user)): Extension<AuthUser>) -> Json<MeResponse> {
    Json(MeResponse {
        user_id: user.id.to_string(),
        email: user.email,
        display_name: user.display_name,
    })
}

pub async fn get_profile(Extension(AuthUser(user)): Extension<AuthUser>) -> Json<User> {
    Json(user)
}

#[derive(Debug, Deserialize)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub preferences: Option<DietaryPreferences>,
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(update): Json<ProfileUpdate>,
) -> AppResult<Json<User>> {
    let display_name = match update.display_name {
        Some(name) if name.trim().is_empty() => {
            return Err(Error::validation("Display name must not be empty").into());
        }
        Some(name) => name.trim().to_string(),
        None => user.display_name.clone(),
    };
    let mut preferences = update.preferences.unwrap_or(user.preferences);
    preferences.allergies = preferences
        .allergies
        .iter()
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .collect();

    let updated = UserRepository::new(state.pool.clone())
        .update_profile(user.id, &display_name, &preferences)
        .await?
        .ok_or_else(|| Error::not_found("User"))?;
    Ok(Json(updated))
}
