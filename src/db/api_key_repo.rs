use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{parse_id, parse_timestamp};
use crate::models::User;

/// Metadata of an issued key. The token itself is never stored.
#[derive(Debug, Clone, Serialize)]
pub struct ApiKeyInfo {
    pub key_hash: String,
    pub user_id: Uuid,
    pub label: String,
    pub created_at: DateTime<Utc>,
}

pub struct ApiKeyRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct ApiKeyRow {
    key_hash: String,
    user_id: String,
    label: String,
    created_at: String,
}

/// Generates a secure random token.
///
/// Returns 32 random bytes encoded as base64url (no padding).
fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Hex SHA-256 of a bearer token, as stored in `api_keys.key_hash`.
pub fn hash_token(token: &str) -> String {
    Sha256::digest(token.as_bytes())
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

impl ApiKeyRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Issues a new key and returns the clear token. It cannot be recovered later.
    pub async fn issue(&self, user_id: Uuid, label: &str) -> Result<String, sqlx::Error> {
        let token = generate_token();
        sqlx::query(
            "INSERT INTO api_keys (key_hash, user_id, label, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(hash_token(&token))
        .bind(user_id.to_string())
        .bind(label)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(token)
    }

    /// Resolves a bearer token to its user.
    pub async fn authenticate(&self, token: &str) -> Result<Option<User>, sqlx::Error> {
        let user_id: Option<(String,)> =
            sqlx::query_as("SELECT user_id FROM api_keys WHERE key_hash = ?")
                .bind(hash_token(token))
                .fetch_optional(&self.pool)
                .await?;

        match user_id {
            Some((id,)) => {
                super::UserRepository::new(self.pool.clone())
                    .get_by_id(parse_id(&id)?)
                    .await
            }
            None => Ok(None),
        }
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<ApiKeyInfo>, sqlx::Error> {
        let rows: Vec<ApiKeyRow> =
            sqlx::query_as("SELECT * FROM api_keys WHERE user_id = ? ORDER BY created_at")
                .bind(user_id.to_string())
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter()
            .map(|row| {
                Ok(ApiKeyInfo {
                    key_hash: row.key_hash,
                    user_id: parse_id(&row.user_id)?,
                    label: row.label,
                    created_at: parse_timestamp(&row.created_at),
                })
            })
            .collect()
    }

    /// Revokes one key by its clear token.
    pub async fn revoke(&self, token: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM api_keys WHERE key_hash = ?")
            .bind(hash_token(token))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Revokes every key of a user and returns how many were removed.
    pub async fn revoke_all(&self, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM api_keys WHERE user_id = ?")
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
