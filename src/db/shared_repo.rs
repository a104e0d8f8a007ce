use serde::Deserialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{cascade, from_json, parse_id, parse_timestamp, to_json};
use crate::error::{Error, Result};
use crate::models::{Recipe, SharedRecipe, TimeCategory};

pub const DEFAULT_FEED_LIMIT: i64 = 20;
pub const MAX_FEED_LIMIT: i64 = 100;

/// Paging and filtering for the community feed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedQuery {
    pub time: Option<TimeCategory>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl FeedQuery {
    fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_FEED_LIMIT)
            .clamp(1, MAX_FEED_LIMIT)
    }

    fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }

    /// Inclusive minute bounds for the time filter.
    fn time_bounds(&self) -> Option<(i64, i64)> {
        let quick = TimeCategory::QUICK_MAX as i64;
        let moderate = TimeCategory::MODERATE_MAX as i64;
        self.time.map(|category| match category {
            TimeCategory::Quick => (0, quick),
            TimeCategory::Moderate => (quick + 1, moderate),
            TimeCategory::Lengthy => (moderate + 1, i64::MAX),
        })
    }
}

pub struct SharedRecipeRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct SharedRow {
    id: String,
    original_recipe_id: String,
    author_id: String,
    author_name: String,
    title: String,
    description: String,
    ingredients: String,
    instructions: String,
    prep_time: Option<i32>,
    cook_time: Option<i32>,
    servings: Option<i32>,
    tags: String,
    image_url: Option<String>,
    average_rating: f64,
    rating_count: i64,
    shared_at: String,
}

impl TryFrom<SharedRow> for SharedRecipe {
    type Error = sqlx::Error;

    fn try_from(row: SharedRow) -> std::result::Result<Self, Self::Error> {
        Ok(SharedRecipe {
            id: parse_id(&row.id)?,
            original_recipe_id: parse_id(&row.original_recipe_id)?,
            author_id: parse_id(&row.author_id)?,
            author_name: row.author_name,
            title: row.title,
            description: row.description,
            ingredients: from_json(&row.ingredients),
            instructions: from_json(&row.instructions),
            prep_time: row.prep_time,
            cook_time: row.cook_time,
            servings: row.servings,
            tags: from_json(&row.tags),
            image_url: row.image_url,
            average_rating: row.average_rating,
            rating_count: row.rating_count,
            shared_at: parse_timestamp(&row.shared_at),
        })
    }
}

impl SharedRecipeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Posts a copy of `recipe` to the feed. A recipe can be shared once.
    pub async fn share(&self, recipe: &Recipe, author_name: &str) -> Result<SharedRecipe> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<(String,)> =
            sqlx::query_as("SELECT id FROM shared_recipes WHERE original_recipe_id = ? LIMIT 1")
                .bind(recipe.id.to_string())
                .fetch_optional(&mut *tx)
                .await?;
        if let Some((id,)) = existing {
            return Err(Error::Conflict(format!(
                "Recipe '{}' is already shared as {}",
                recipe.title, id
            )));
        }

        let shared = SharedRecipe::from_recipe(recipe, author_name);
        sqlx::query(
            r#"
            INSERT INTO shared_recipes (id, original_recipe_id, author_id, author_name, title, description,
                ingredients, instructions, prep_time, cook_time, servings, tags, image_url,
                average_rating, rating_count, shared_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(shared.id.to_string())
        .bind(shared.original_recipe_id.to_string())
        .bind(shared.author_id.to_string())
        .bind(&shared.author_name)
        .bind(&shared.title)
        .bind(&shared.description)
        .bind(to_json(&shared.ingredients))
        .bind(to_json(&shared.instructions))
        .bind(shared.prep_time)
        .bind(shared.cook_time)
        .bind(shared.servings)
        .bind(to_json(&shared.tags))
        .bind(&shared.image_url)
        .bind(shared.average_rating)
        .bind(shared.rating_count)
        .bind(shared.shared_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(shared_id = %shared.id, recipe_id = %recipe.id, "shared recipe");
        Ok(shared)
    }

    pub async fn get(&self, id: Uuid) -> std::result::Result<Option<SharedRecipe>, sqlx::Error> {
        let row: Option<SharedRow> = sqlx::query_as("SELECT * FROM shared_recipes WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(SharedRecipe::try_from).transpose()
    }

    /// Newest first, optionally filtered by time category. Recipes with no
    /// time never match a time filter.
    pub async fn feed(
        &self,
        query: &FeedQuery,
    ) -> std::result::Result<Vec<SharedRecipe>, sqlx::Error> {
        let rows: Vec<SharedRow> = match query.time_bounds() {
            Some((min, max)) => {
                sqlx::query_as(
                    r#"
                    SELECT * FROM shared_recipes
                    WHERE (prep_time IS NOT NULL OR cook_time IS NOT NULL)
                      AND MAX(COALESCE(prep_time, 0) + COALESCE(cook_time, 0), 0) BETWEEN ? AND ?
                    ORDER BY shared_at DESC
                    LIMIT ? OFFSET ?
                    "#,
                )
                .bind(min)
                .bind(max)
                .bind(query.limit())
                .bind(query.offset())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as("SELECT * FROM shared_recipes ORDER BY shared_at DESC LIMIT ? OFFSET ?")
                    .bind(query.limit())
                    .bind(query.offset())
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        rows.into_iter().map(SharedRecipe::try_from).collect()
    }

    pub async fn list_by_author(
        &self,
        author_id: Uuid,
    ) -> std::result::Result<Vec<SharedRecipe>, sqlx::Error> {
        let rows: Vec<SharedRow> =
            sqlx::query_as("SELECT * FROM shared_recipes WHERE author_id = ? ORDER BY shared_at DESC")
                .bind(author_id.to_string())
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter().map(SharedRecipe::try_from).collect()
    }

    /// Unshares a recipe. Only its author may do this; ratings and
    /// comments are removed afterwards.
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<()> {
        let shared = self
            .get(id)
            .await?
            .ok_or_else(|| Error::not_found("Shared recipe"))?;
        if shared.author_id != user_id {
            return Err(Error::Forbidden(
                "Only the author can unshare this recipe".to_string(),
            ));
        }

        sqlx::query("DELETE FROM shared_recipes WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        cascade::on_shared_recipe_deleted(&self.pool, id).await;
        Ok(())
    }
}
