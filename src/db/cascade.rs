//! Cleanup that runs after a parent document is deleted.
//!
//! Shared recipes, ratings and comments carry no foreign keys to their
//! parents, so these hooks remove the orphans. They never fail the delete
//! that triggered them: errors are logged and reported as zero removals.

use sqlx::{Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

async fn delete_children(
    tx: &mut Transaction<'_, Sqlite>,
    shared_id: &str,
) -> Result<u64, sqlx::Error> {
    let ratings = sqlx::query("DELETE FROM ratings WHERE shared_recipe_id = ?")
        .bind(shared_id)
        .execute(&mut **tx)
        .await?
        .rows_affected();
    let comments = sqlx::query("DELETE FROM comments WHERE shared_recipe_id = ?")
        .bind(shared_id)
        .execute(&mut **tx)
        .await?
        .rows_affected();
    Ok(ratings + comments)
}

async fn remove_shared_copies(pool: &SqlitePool, recipe_id: Uuid) -> Result<u64, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let shared: Vec<(String,)> =
        sqlx::query_as("SELECT id FROM shared_recipes WHERE original_recipe_id = ?")
            .bind(recipe_id.to_string())
            .fetch_all(&mut *tx)
            .await?;

    if shared.is_empty() {
        return Ok(0);
    }

    let mut removed = 0;
    for (shared_id,) in &shared {
        delete_children(&mut tx, shared_id).await?;
        removed += sqlx::query("DELETE FROM shared_recipes WHERE id = ?")
            .bind(shared_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
    }

    tx.commit().await?;
    Ok(removed)
}

/// Removes every shared copy of a deleted personal recipe, with their
/// ratings and comments. Returns the number of shared copies removed.
pub async fn on_recipe_deleted(pool: &SqlitePool, recipe_id: Uuid) -> u64 {
    match remove_shared_copies(pool, recipe_id).await {
        Ok(0) => 0,
        Ok(removed) => {
            tracing::info!(%recipe_id, removed, "removed shared copies of deleted recipe");
            removed
        }
        Err(e) => {
            tracing::error!(%recipe_id, error = %e, "failed to remove shared copies");
            0
        }
    }
}

async fn remove_children(pool: &SqlitePool, shared_id: Uuid) -> Result<u64, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let removed = delete_children(&mut tx, &shared_id.to_string()).await?;
    tx.commit().await?;
    Ok(removed)
}

/// Removes the ratings and comments of a deleted shared recipe.
/// Returns how many were removed.
pub async fn on_shared_recipe_deleted(pool: &SqlitePool, shared_id: Uuid) -> u64 {
    match remove_children(pool, shared_id).await {
        Ok(removed) => {
            tracing::debug!(%shared_id, removed, "removed ratings and comments");
            removed
        }
        Err(e) => {
            tracing::error!(%shared_id, error = %e, "failed to remove ratings and comments");
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::test_db;
    use chrono::Utc;

    async fn insert_shared(pool: &SqlitePool, original: Uuid) -> Uuid {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO shared_recipes (id, original_recipe_id, author_id, author_name, title, shared_at) VALUES (?, ?, ?, 'A', 'T', ?)",
        )
        .bind(id.to_string())
        .bind(original.to_string())
        .bind(Uuid::new_v4().to_string())
        .bind(Utc::now().to_rfc3339())
        .execute(pool)
        .await
        .unwrap();
        id
    }

    async fn insert_rating(pool: &SqlitePool, shared: Uuid) {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO ratings (id, shared_recipe_id, user_id, score, created_at, updated_at) VALUES (?, ?, ?, 4, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(shared.to_string())
        .bind(Uuid::new_v4().to_string())
        .bind(&now)
        .bind(&now)
        .execute(pool)
        .await
        .unwrap();
    }

    async fn insert_comment(pool: &SqlitePool, shared: Uuid) {
        sqlx::query(
            "INSERT INTO comments (id, shared_recipe_id, user_id, author_name, body, created_at) VALUES (?, ?, ?, 'C', 'nice', ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(shared.to_string())
        .bind(Uuid::new_v4().to_string())
        .bind(Utc::now().to_rfc3339())
        .execute(pool)
        .await
        .unwrap();
    }

    async fn count(pool: &SqlitePool, table: &str) -> i64 {
        let (n,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(pool)
            .await
            .unwrap();
        n
    }

    #[tokio::test]
    async fn test_recipe_delete_removes_exactly_its_copies() {
        let db = test_db().await;
        let recipe = Uuid::new_v4();
        let unrelated = Uuid::new_v4();

        let a = insert_shared(&db.pool, recipe).await;
        let b = insert_shared(&db.pool, recipe).await;
        let keep = insert_shared(&db.pool, unrelated).await;
        insert_rating(&db.pool, a).await;
        insert_comment(&db.pool, b).await;
        insert_rating(&db.pool, keep).await;

        assert_eq!(on_recipe_deleted(&db.pool, recipe).await, 2);

        assert_eq!(count(&db.pool, "shared_recipes").await, 1);
        assert_eq!(count(&db.pool, "ratings").await, 1);
        assert_eq!(count(&db.pool, "comments").await, 0);
    }

    #[tokio::test]
    async fn test_no_copies_is_noop() {
        let db = test_db().await;
        assert_eq!(on_recipe_deleted(&db.pool, Uuid::new_v4()).await, 0);
        assert_eq!(on_shared_recipe_deleted(&db.pool, Uuid::new_v4()).await, 0);
    }

    #[tokio::test]
    async fn test_shared_delete_removes_children() {
        let db = test_db().await;
        let shared = insert_shared(&db.pool, Uuid::new_v4()).await;
        let other = insert_shared(&db.pool, Uuid::new_v4()).await;
        insert_rating(&db.pool, shared).await;
        insert_rating(&db.pool, shared).await;
        insert_comment(&db.pool, shared).await;
        insert_comment(&db.pool, other).await;

        assert_eq!(on_shared_recipe_deleted(&db.pool, shared).await, 3);
        assert_eq!(count(&db.pool, "ratings").await, 0);
        assert_eq!(count(&db.pool, "comments").await, 1);
    }

    #[tokio::test]
    async fn test_failure_is_swallowed() {
        let db = test_db().await;
        db.pool.close().await;
        assert_eq!(on_recipe_deleted(&db.pool, Uuid::new_v4()).await, 0);
        assert_eq!(on_shared_recipe_deleted(&db.pool, Uuid::new_v4()).await, 0);
    }
}
