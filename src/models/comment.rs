use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    pub id: Uuid,
    pub shared_recipe_id: Uuid,
    pub user_id: Uuid,
    pub author_name: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub const MAX_LEN: usize = 1000;

    pub fn new(
        shared_recipe_id: Uuid,
        user_id: Uuid,
        author_name: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            shared_recipe_id,
            user_id,
            author_name: author_name.into(),
            body: body.into(),
            created_at: Utc::now(),
        }
    }
}
