use sqlx::SqlitePool;
use uuid::Uuid;

use super::{parse_id, parse_timestamp};
use crate::error::{Error, Result};
use crate::models::Comment;

pub struct CommentRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: String,
    shared_recipe_id: String,
    user_id: String,
    author_name: String,
    body: String,
    created_at: String,
}

impl TryFrom<CommentRow> for Comment {
    type Error = sqlx::Error;

    fn try_from(row: CommentRow) -> std::result::Result<Self, Self::Error> {
        Ok(Comment {
            id: parse_id(&row.id)?,
            shared_recipe_id: parse_id(&row.shared_recipe_id)?,
            user_id: parse_id(&row.user_id)?,
            author_name: row.author_name,
            body: row.body,
            created_at: parse_timestamp(&row.created_at),
        })
    }
}

impl CommentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn add(
        &self,
        shared_id: Uuid,
        user_id: Uuid,
        author_name: &str,
        body: &str,
    ) -> Result<Comment> {
        let body = body.trim();
        if body.is_empty() {
            return Err(Error::validation("Comment must not be empty"));
        }
        if body.chars().count() > Comment::MAX_LEN {
            return Err(Error::validation(format!(
                "Comment is longer than {} characters",
                Comment::MAX_LEN
            )));
        }

        let exists: Option<(String,)> = sqlx::query_as("SELECT id FROM shared_recipes WHERE id = ?")
            .bind(shared_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_none() {
            return Err(Error::not_found("Shared recipe"));
        }

        let comment = Comment::new(shared_id, user_id, author_name, body);
        sqlx::query(
            "INSERT INTO comments (id, shared_recipe_id, user_id, author_name, body, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(comment.id.to_string())
        .bind(shared_id.to_string())
        .bind(user_id.to_string())
        .bind(&comment.author_name)
        .bind(&comment.body)
        .bind(comment.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(comment)
    }

    /// Comments on a shared recipe, oldest first.
    pub async fn list(&self, shared_id: Uuid) -> Result<Vec<Comment>> {
        let rows: Vec<CommentRow> = sqlx::query_as(
            "SELECT * FROM comments WHERE shared_recipe_id = ? ORDER BY created_at",
        )
        .bind(shared_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(Comment::try_from)
            .collect::<std::result::Result<_, _>>()?)
    }

    /// Deletes a comment written by `user_id`.
    pub async fn delete(&self, shared_id: Uuid, comment_id: Uuid, user_id: Uuid) -> Result<()> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT user_id FROM comments WHERE id = ? AND shared_recipe_id = ?")
                .bind(comment_id.to_string())
                .bind(shared_id.to_string())
                .fetch_optional(&self.pool)
                .await?;

        let (owner,) = row.ok_or_else(|| Error::not_found("Comment"))?;
        if owner != user_id.to_string() {
            return Err(Error::Forbidden(
                "You can only delete your own comments".to_string(),
            ));
        }

        sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(comment_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
