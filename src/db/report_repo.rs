use sqlx::SqlitePool;

use super::{parse_id, parse_timestamp};
use crate::models::{Report, ReportCategory};

pub struct ReportRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct ReportRow {
    id: String,
    user_id: String,
    category: String,
    message: String,
    shared_recipe_id: Option<String>,
    created_at: String,
}

impl TryFrom<ReportRow> for Report {
    type Error = sqlx::Error;

    fn try_from(row: ReportRow) -> Result<Self, Self::Error> {
        Ok(Report {
            id: parse_id(&row.id)?,
            user_id: parse_id(&row.user_id)?,
            category: row.category.parse().unwrap_or(ReportCategory::Other),
            message: row.message,
            shared_recipe_id: row.shared_recipe_id.as_deref().map(parse_id).transpose()?,
            created_at: parse_timestamp(&row.created_at),
        })
    }
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, report: &Report) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO reports (id, user_id, category, message, shared_recipe_id, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(report.id.to_string())
        .bind(report.user_id.to_string())
        .bind(report.category.to_string())
        .bind(&report.message)
        .bind(report.shared_recipe_id.map(|id| id.to_string()))
        .bind(report.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        tracing::info!(report_id = %report.id, category = %report.category, "report filed");
        Ok(())
    }

    /// Newest first, optionally narrowed to one category.
    pub async fn list(&self, category: Option<ReportCategory>) -> Result<Vec<Report>, sqlx::Error> {
        let rows: Vec<ReportRow> = match category {
            Some(category) => {
                sqlx::query_as("SELECT * FROM reports WHERE category = ? ORDER BY created_at DESC")
                    .bind(category.to_string())
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_as("SELECT * FROM reports ORDER BY created_at DESC")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        rows.into_iter().map(Report::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::test_db;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_create_and_list() {
        let db = test_db().await;
        let repo = ReportRepository::new(db.pool.clone());
        let user = Uuid::new_v4();

        let mut content = Report::new(user, ReportCategory::Content, "spam recipe");
        content.shared_recipe_id = Some(Uuid::new_v4());
        repo.create(&content).await.unwrap();
        repo.create(&Report::new(user, ReportCategory::Bug, "crash on save"))
            .await
            .unwrap();

        let all = repo.list(None).await.unwrap();
        assert_eq!(all.len(), 2);

        let bugs = repo.list(Some(ReportCategory::Bug)).await.unwrap();
        assert_eq!(bugs.len(), 1);
        assert_eq!(bugs[0].message, "crash on save");

        let content_reports = repo.list(Some(ReportCategory::Content)).await.unwrap();
        assert_eq!(content_reports[0].shared_recipe_id, content.shared_recipe_id);
    }
}
