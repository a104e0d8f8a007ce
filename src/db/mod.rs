mod api_key_repo;
pub mod cascade;
mod comment_repo;
mod pantry_repo;
mod rating_repo;
mod recipe_repo;
mod report_repo;
mod shared_repo;
mod user_repo;

pub use api_key_repo::{hash_token, ApiKeyInfo, ApiKeyRepository};
pub use comment_repo::CommentRepository;
pub use pantry_repo::{Deduction, DeductionReport, PantryRepository, SkippedIngredient};
pub use rating_repo::RatingRepository;
pub use recipe_repo::RecipeRepository;
pub use report_repo::ReportRepository;
pub use shared_repo::{FeedQuery, SharedRecipeRepository};
pub use user_repo::UserRepository;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use uuid::Uuid;

/// Initialize the database connection pool and run migrations
pub async fn init_db(path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite:{}?mode=rwc", path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .foreign_keys(true)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    // Run migrations
    sqlx::migrate!("./migrations").run(&pool).await?;

    tracing::debug!(path = %path.display(), "database ready");

    Ok(pool)
}

pub(crate) fn parse_id(value: &str) -> Result<Uuid, sqlx::Error> {
    Uuid::parse_str(value).map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

pub(crate) fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

pub(crate) fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "[]".to_string())
}

pub(crate) fn from_json<T: serde::de::DeserializeOwned + Default>(value: &str) -> T {
    serde_json::from_str(value).unwrap_or_default()
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::models::User;
    use tempfile::TempDir;

    /// A throwaway database, deleted when dropped.
    pub struct TestDb {
        pub pool: SqlitePool,
        _temp_dir: TempDir, // Keep alive for duration of test
    }

    pub async fn test_db() -> TestDb {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let pool = init_db(&db_path).await.unwrap();
        TestDb {
            pool,
            _temp_dir: temp_dir,
        }
    }

    pub async fn create_user(pool: &SqlitePool, email: &str, name: &str) -> User {
        UserRepository::new(pool.clone())
            .create(&User::new(email, name))
            .await
            .unwrap()
    }
}
