use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One user's rating of a shared recipe.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rating {
    pub id: Uuid,
    pub shared_recipe_id: Uuid,
    pub user_id: Uuid,
    pub score: i32,
    pub review: Option<String>,
    /// Soft-delete flag; deleted ratings are excluded from aggregates.
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Rating {
    pub const MIN_SCORE: i32 = 1;
    pub const MAX_SCORE: i32 = 5;

    pub fn is_valid_score(score: i32) -> bool {
        (Self::MIN_SCORE..=Self::MAX_SCORE).contains(&score)
    }
}

/// Aggregate over the non-deleted ratings of a shared recipe.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RatingSummary {
    pub average: f64,
    pub count: i64,
}
