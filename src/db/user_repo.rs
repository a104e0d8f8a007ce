use sqlx::SqlitePool;
use uuid::Uuid;

use super::{from_json, parse_id, parse_timestamp, to_json};
use crate::models::{DietaryPreferences, User};

pub struct UserRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    email: String,
    display_name: String,
    preferences: String,
    created_at: String,
}

impl TryFrom<UserRow> for User {
    type Error = sqlx::Error;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: parse_id(&row.id)?,
            email: row.email,
            display_name: row.display_name,
            preferences: from_json(&row.preferences),
            created_at: parse_timestamp(&row.created_at),
        })
    }
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user: &User) -> Result<User, sqlx::Error> {
        sqlx::query(
            "INSERT INTO users (id, email, display_name, preferences, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(user.id.to_string())
        .bind(user.email.trim().to_lowercase())
        .bind(&user.display_name)
        .bind(to_json(&user.preferences))
        .bind(user.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        self.get_by_id(user.id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE email = ?")
            .bind(email.trim().to_lowercase())
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }

    /// Returns the user with this email, creating it on first use.
    pub async fn ensure(&self, email: &str) -> Result<User, sqlx::Error> {
        if let Some(user) = self.get_by_email(email).await? {
            return Ok(user);
        }
        let display_name = email.split('@').next().unwrap_or(email).to_string();
        tracing::info!(email, "creating user");
        self.create(&User::new(email, display_name)).await
    }

    pub async fn list(&self) -> Result<Vec<User>, sqlx::Error> {
        let rows: Vec<UserRow> = sqlx::query_as("SELECT * FROM users ORDER BY email")
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(User::try_from).collect()
    }

    pub async fn update_profile(
        &self,
        id: Uuid,
        display_name: &str,
        preferences: &DietaryPreferences,
    ) -> Result<Option<User>, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET display_name = ?, preferences = ? WHERE id = ?")
            .bind(display_name)
            .bind(to_json(preferences))
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    /// Deletes a user. API keys, pantry items and personal recipes go with it.
    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::test_db;

    #[tokio::test]
    async fn test_create_and_get_by_email_case_insensitive() {
        let db = test_db().await;
        let repo = UserRepository::new(db.pool.clone());

        let created = repo.create(&User::new("Cook@Example.com", "Cook")).await.unwrap();
        assert_eq!(created.email, "cook@example.com");

        let found = repo.get_by_email("COOK@example.com").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let db = test_db().await;
        let repo = UserRepository::new(db.pool.clone());

        repo.create(&User::new("a@example.com", "A")).await.unwrap();
        assert!(repo.create(&User::new("a@example.com", "B")).await.is_err());
    }

    #[tokio::test]
    async fn test_ensure_is_idempotent() {
        let db = test_db().await;
        let repo = UserRepository::new(db.pool.clone());

        let first = repo.ensure("sam@example.com").await.unwrap();
        let second = repo.ensure("sam@example.com").await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.display_name, "sam");
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_profile() {
        let db = test_db().await;
        let repo = UserRepository::new(db.pool.clone());
        let user = repo.create(&User::new("v@example.com", "V")).await.unwrap();

        let prefs = DietaryPreferences {
            vegetarian: true,
            allergies: vec!["peanuts".into()],
            ..Default::default()
        };
        let updated = repo
            .update_profile(user.id, "Veggie", &prefs)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.display_name, "Veggie");
        assert_eq!(updated.preferences, prefs);

        assert!(repo
            .update_profile(Uuid::new_v4(), "Nobody", &prefs)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_delete() {
        let db = test_db().await;
        let repo = UserRepository::new(db.pool.clone());
        let user = repo.create(&User::new("gone@example.com", "Gone")).await.unwrap();

        assert!(repo.delete(user.id).await.unwrap());
        assert!(!repo.delete(user.id).await.unwrap());
        assert!(repo.get_by_id(user.id).await.unwrap().is_none());
    }
}
