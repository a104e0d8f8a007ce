use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ingredient::Ingredient;
use super::recipe::{total_time, Recipe};
use super::time_category::TimeCategory;

/// Public copy of a personal recipe, posted to the community feed.
///
/// Author details are denormalized so the feed never joins against users.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SharedRecipe {
    pub id: Uuid,
    pub original_recipe_id: Uuid,
    pub author_id: Uuid,
    pub author_name: String,
    pub title: String,
    pub description: String,
    pub ingredients: Vec<Ingredient>,
    pub instructions: Vec<String>,
    pub prep_time: Option<i32>,
    pub cook_time: Option<i32>,
    pub servings: Option<i32>,
    pub tags: Vec<String>,
    pub image_url: Option<String>,
    pub average_rating: f64,
    pub rating_count: i64,
    pub shared_at: DateTime<Utc>,
}

impl SharedRecipe {
    /// Copies a personal recipe with no ratings yet.
    pub fn from_recipe(recipe: &Recipe, author_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            original_recipe_id: recipe.id,
            author_id: recipe.user_id,
            author_name: author_name.into(),
            title: recipe.title.clone(),
            description: recipe.description.clone(),
            ingredients: recipe.ingredients.clone(),
            instructions: recipe.instructions.clone(),
            prep_time: recipe.prep_time,
            cook_time: recipe.cook_time,
            servings: recipe.servings,
            tags: recipe.tags.clone(),
            image_url: recipe.image_url.clone(),
            average_rating: 0.0,
            rating_count: 0,
            shared_at: Utc::now(),
        }
    }

    pub fn total_time(&self) -> Option<i32> {
        total_time(self.prep_time, self.cook_time)
    }

    pub fn time_category(&self) -> Option<TimeCategory> {
        self.total_time()
            .map(|minutes| TimeCategory::classify(minutes.max(0) as u32))
    }
}
