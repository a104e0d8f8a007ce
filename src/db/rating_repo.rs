use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use super::{parse_id, parse_timestamp};
use crate::error::{Error, Result};
use crate::models::{Rating, RatingSummary};

pub struct RatingRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct RatingRow {
    id: String,
    shared_recipe_id: String,
    user_id: String,
    score: i32,
    review: Option<String>,
    deleted: bool,
    created_at: String,
    updated_at: String,
}

impl TryFrom<RatingRow> for Rating {
    type Error = sqlx::Error;

    fn try_from(row: RatingRow) -> std::result::Result<Self, Self::Error> {
        Ok(Rating {
            id: parse_id(&row.id)?,
            shared_recipe_id: parse_id(&row.shared_recipe_id)?,
            user_id: parse_id(&row.user_id)?,
            score: row.score,
            review: row.review,
            deleted: row.deleted,
            created_at: parse_timestamp(&row.created_at),
            updated_at: parse_timestamp(&row.updated_at),
        })
    }
}

/// Rewrites the cached aggregate from the live ratings.
async fn recompute(tx: &mut Transaction<'_, Sqlite>, shared_id: &str) -> Result<RatingSummary> {
    let (average, count): (Option<f64>, i64) = sqlx::query_as(
        "SELECT AVG(score), COUNT(*) FROM ratings WHERE shared_recipe_id = ? AND deleted = 0",
    )
    .bind(shared_id)
    .fetch_one(&mut **tx)
    .await?;

    let summary = RatingSummary {
        average: average.unwrap_or(0.0),
        count,
    };

    sqlx::query("UPDATE shared_recipes SET average_rating = ?, rating_count = ? WHERE id = ?")
        .bind(summary.average)
        .bind(summary.count)
        .bind(shared_id)
        .execute(&mut **tx)
        .await?;

    Ok(summary)
}

impl RatingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates or replaces the user's rating and refreshes the aggregate.
    ///
    /// A previously removed rating is restored rather than duplicated.
    pub async fn submit(
        &self,
        shared_id: Uuid,
        user_id: Uuid,
        score: i32,
        review: Option<&str>,
    ) -> Result<RatingSummary> {
        if !Rating::is_valid_score(score) {
            return Err(Error::validation(format!(
                "Score must be between {} and {}, got {}",
                Rating::MIN_SCORE,
                Rating::MAX_SCORE,
                score
            )));
        }
        let review = review.map(str::trim).filter(|r| !r.is_empty());
        let shared_str = shared_id.to_string();
        let user_str = user_id.to_string();
        let now = Utc::now().to_rfc3339();

        let mut tx = self.pool.begin().await?;

        let author: Option<(String,)> =
            sqlx::query_as("SELECT author_id FROM shared_recipes WHERE id = ?")
                .bind(&shared_str)
                .fetch_optional(&mut *tx)
                .await?;
        let (author_id,) = author.ok_or_else(|| Error::not_found("Shared recipe"))?;
        if author_id == user_str {
            return Err(Error::Forbidden(
                "You cannot rate your own recipe".to_string(),
            ));
        }

        let existing: Option<(String,)> =
            sqlx::query_as("SELECT id FROM ratings WHERE shared_recipe_id = ? AND user_id = ?")
                .bind(&shared_str)
                .bind(&user_str)
                .fetch_optional(&mut *tx)
                .await?;

        match existing {
            Some((id,)) => {
                sqlx::query(
                    "UPDATE ratings SET score = ?, review = ?, deleted = 0, updated_at = ? WHERE id = ?",
                )
                .bind(score)
                .bind(review)
                .bind(&now)
                .bind(&id)
                .execute(&mut *tx)
                .await?;
            }
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO ratings (id, shared_recipe_id, user_id, score, review, deleted, created_at, updated_at)
                    VALUES (?, ?, ?, ?, ?, 0, ?, ?)
                    "#,
                )
                .bind(Uuid::new_v4().to_string())
                .bind(&shared_str)
                .bind(&user_str)
                .bind(score)
                .bind(review)
                .bind(&now)
                .bind(&now)
                .execute(&mut *tx)
                .await?;
            }
        }

        let summary = recompute(&mut tx, &shared_str).await?;
        tx.commit().await?;

        tracing::debug!(%shared_id, %user_id, score, average = summary.average, "rating submitted");
        Ok(summary)
    }

    /// Soft-deletes the user's rating and refreshes the aggregate.
    pub async fn remove(&self, shared_id: Uuid, user_id: Uuid) -> Result<RatingSummary> {
        let shared_str = shared_id.to_string();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE ratings SET deleted = 1, updated_at = ? WHERE shared_recipe_id = ? AND user_id = ? AND deleted = 0",
        )
        .bind(Utc::now().to_rfc3339())
        .bind(&shared_str)
        .bind(user_id.to_string())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("Rating"));
        }

        let summary = recompute(&mut tx, &shared_str).await?;
        tx.commit().await?;
        Ok(summary)
    }

    /// Live ratings of a shared recipe, newest first.
    pub async fn list(&self, shared_id: Uuid) -> Result<Vec<Rating>> {
        let rows: Vec<RatingRow> = sqlx::query_as(
            "SELECT * FROM ratings WHERE shared_recipe_id = ? AND deleted = 0 ORDER BY updated_at DESC",
        )
        .bind(shared_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(Rating::try_from)
            .collect::<std::result::Result<_, _>>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::{create_user, test_db};
    use crate::db::{RecipeRepository, SharedRecipeRepository};
    use crate::models::{Recipe, User};

    struct Fixture {
        _db: crate::db::testing::TestDb,
        repo: RatingRepository,
        shared_repo: SharedRecipeRepository,
        author: User,
        shared_id: Uuid,
    }

    async fn setup() -> Fixture {
        let db = test_db().await;
        let author = create_user(&db.pool, "author@example.com", "Author").await;
        let recipe = RecipeRepository::new(db.pool.clone())
            .create(&Recipe::new("Stew", author.id))
            .await
            .unwrap();
        let shared_repo = SharedRecipeRepository::new(db.pool.clone());
        let shared = shared_repo.share(&recipe, "Author").await.unwrap();
        Fixture {
            repo: RatingRepository::new(db.pool.clone()),
            shared_repo,
            author,
            shared_id: shared.id,
            _db: db,
        }
    }

    #[tokio::test]
    async fn test_submit_updates_aggregate() {
        let fx = setup().await;
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let summary = fx.repo.submit(fx.shared_id, a, 4, None).await.unwrap();
        assert_eq!(summary.count, 1);
        assert_eq!(summary.average, 4.0);

        let summary = fx.repo.submit(fx.shared_id, b, 5, Some("great")).await.unwrap();
        assert_eq!(summary.count, 2);
        assert_eq!(summary.average, 4.5);

        let shared = fx.shared_repo.get(fx.shared_id).await.unwrap().unwrap();
        assert_eq!(shared.rating_count, 2);
        assert_eq!(shared.average_rating, 4.5);
    }

    #[tokio::test]
    async fn test_resubmit_replaces_instead_of_duplicating() {
        let fx = setup().await;
        let user = Uuid::new_v4();

        fx.repo.submit(fx.shared_id, user, 2, None).await.unwrap();
        let summary = fx.repo.submit(fx.shared_id, user, 5, None).await.unwrap();
        assert_eq!(summary.count, 1);
        assert_eq!(summary.average, 5.0);
        assert_eq!(fx.repo.list(fx.shared_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_score_rejected() {
        let fx = setup().await;
        for score in [0, 6, -1] {
            assert!(matches!(
                fx.repo.submit(fx.shared_id, Uuid::new_v4(), score, None).await,
                Err(Error::Validation(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_cannot_rate_own_recipe() {
        let fx = setup().await;
        assert!(matches!(
            fx.repo.submit(fx.shared_id, fx.author.id, 5, None).await,
            Err(Error::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_shared_recipe() {
        let fx = setup().await;
        assert!(matches!(
            fx.repo.submit(Uuid::new_v4(), Uuid::new_v4(), 3, None).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_remove_and_restore() {
        let fx = setup().await;
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        fx.repo.submit(fx.shared_id, a, 1, None).await.unwrap();
        fx.repo.submit(fx.shared_id, b, 5, None).await.unwrap();

        let summary = fx.repo.remove(fx.shared_id, a).await.unwrap();
        assert_eq!(summary.count, 1);
        assert_eq!(summary.average, 5.0);

        assert!(matches!(
            fx.repo.remove(fx.shared_id, a).await,
            Err(Error::NotFound(_))
        ));

        // resubmitting clears the soft delete
        let summary = fx.repo.submit(fx.shared_id, a, 3, None).await.unwrap();
        assert_eq!(summary.count, 2);
        assert_eq!(summary.average, 4.0);
    }

    #[tokio::test]
    async fn test_removing_last_rating_resets_average() {
        let fx = setup().await;
        let a = Uuid::new_v4();
        fx.repo.submit(fx.shared_id, a, 4, None).await.unwrap();

        let summary = fx.repo.remove(fx.shared_id, a).await.unwrap();
        assert_eq!(summary.count, 0);
        assert_eq!(summary.average, 0.0);
        assert!(fx.repo.list(fx.shared_id).await.unwrap().is_empty());
    }
}
