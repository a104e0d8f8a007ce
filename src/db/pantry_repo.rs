use chrono::Utc;
use serde::Serialize;
use sqlx::{Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use super::{parse_id, parse_timestamp};
use crate::error::{Error, Result};
use crate::matching::{find_best_match, normalize_name, STRONG_MATCH};
use crate::models::{Ingredient, PantryItem};
use crate::units::{convert, Unit};

/// Remaining amounts at or below this are treated as used up.
const EMPTY_EPSILON: f64 = 1e-6;

pub struct PantryRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct PantryRow {
    id: String,
    user_id: String,
    name: String,
    quantity: f64,
    unit: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<PantryRow> for PantryItem {
    type Error = sqlx::Error;

    fn try_from(row: PantryRow) -> std::result::Result<Self, Self::Error> {
        Ok(PantryItem {
            id: parse_id(&row.id)?,
            user_id: parse_id(&row.user_id)?,
            name: row.name,
            quantity: row.quantity,
            unit: row.unit,
            created_at: parse_timestamp(&row.created_at),
            updated_at: parse_timestamp(&row.updated_at),
        })
    }
}

/// One ingredient taken out of the pantry.
#[derive(Debug, Clone, Serialize)]
pub struct Deduction {
    pub ingredient: Ingredient,
    pub pantry_item_id: Uuid,
    pub pantry_item_name: String,
    /// Amount subtracted, in the pantry item's unit.
    pub amount: f64,
    pub unit: String,
    /// What is left; zero means the row was removed.
    pub remaining: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedIngredient {
    pub ingredient: Ingredient,
    pub reason: String,
}

/// Outcome of cooking a recipe against the pantry.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeductionReport {
    pub deducted: Vec<Deduction>,
    pub skipped: Vec<SkippedIngredient>,
}

fn validate_item(name: &str, quantity: f64) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::validation("Item name must not be empty"));
    }
    if !quantity.is_finite() || quantity < 0.0 {
        return Err(Error::validation(format!(
            "Quantity must be a non-negative number, got {}",
            quantity
        )));
    }
    Ok(())
}

impl PantryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, user_id: Uuid) -> Result<Vec<PantryItem>> {
        let rows: Vec<PantryRow> =
            sqlx::query_as("SELECT * FROM pantry_items WHERE user_id = ? ORDER BY name")
                .bind(user_id.to_string())
                .fetch_all(&self.pool)
                .await?;
        Ok(rows
            .into_iter()
            .map(PantryItem::try_from)
            .collect::<std::result::Result<_, _>>()?)
    }

    pub async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Option<PantryItem>> {
        let row: Option<PantryRow> =
            sqlx::query_as("SELECT * FROM pantry_items WHERE id = ? AND user_id = ?")
                .bind(id.to_string())
                .bind(user_id.to_string())
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(PantryItem::try_from).transpose()?)
    }

    async fn list_in(
        tx: &mut Transaction<'_, Sqlite>,
        user_id: Uuid,
    ) -> Result<Vec<PantryItem>> {
        let rows: Vec<PantryRow> = sqlx::query_as("SELECT * FROM pantry_items WHERE user_id = ?")
            .bind(user_id.to_string())
            .fetch_all(&mut **tx)
            .await?;
        Ok(rows
            .into_iter()
            .map(PantryItem::try_from)
            .collect::<std::result::Result<_, _>>()?)
    }

    /// Adds stock. An existing item with the same normalized name and a
    /// comparable unit absorbs the quantity, converted into its own unit.
    pub async fn add(
        &self,
        user_id: Uuid,
        name: &str,
        quantity: f64,
        unit: &str,
    ) -> Result<PantryItem> {
        validate_item(name, quantity)?;
        let name = name.trim();
        let unit = unit.trim();
        let now = Utc::now().to_rfc3339();

        let mut tx = self.pool.begin().await?;
        let existing = Self::list_in(&mut tx, user_id).await?;
        let wanted = normalize_name(name);
        let new_unit = Unit::parse(unit);

        let merge_target = existing.iter().find_map(|item| {
            if normalize_name(&item.name) != wanted {
                return None;
            }
            convert(quantity, &new_unit, &Unit::parse(&item.unit))
                .ok()
                .map(|converted| (item, converted))
        });

        let id = match merge_target {
            Some((item, converted)) => {
                sqlx::query("UPDATE pantry_items SET quantity = ?, updated_at = ? WHERE id = ?")
                    .bind(item.quantity + converted)
                    .bind(&now)
                    .bind(item.id.to_string())
                    .execute(&mut *tx)
                    .await?;
                tracing::debug!(item = %item.name, added = converted, "merged pantry stock");
                item.id
            }
            None => {
                let item = PantryItem::new(user_id, name, quantity, unit);
                sqlx::query(
                    r#"
                    INSERT INTO pantry_items (id, user_id, name, quantity, unit, created_at, updated_at)
                    VALUES (?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(item.id.to_string())
                .bind(user_id.to_string())
                .bind(&item.name)
                .bind(item.quantity)
                .bind(&item.unit)
                .bind(item.created_at.to_rfc3339())
                .bind(item.updated_at.to_rfc3339())
                .execute(&mut *tx)
                .await?;
                item.id
            }
        };

        tx.commit().await?;

        self.get(user_id, id)
            .await?
            .ok_or_else(|| Error::not_found("Pantry item"))
    }

    /// Overwrites an item. Returns `None` when it doesn't exist or isn't the user's.
    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        name: &str,
        quantity: f64,
        unit: &str,
    ) -> Result<Option<PantryItem>> {
        validate_item(name, quantity)?;
        let result = sqlx::query(
            r#"
            UPDATE pantry_items SET name = ?, quantity = ?, unit = ?, updated_at = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(name.trim())
        .bind(quantity)
        .bind(unit.trim())
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get(user_id, id).await
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM pantry_items WHERE id = ? AND user_id = ?")
            .bind(id.to_string())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Subtracts a recipe's ingredients from the pantry in one transaction.
    ///
    /// Only confident name matches are touched. Ingredients without a
    /// quantity, without a match, or with an incomparable unit are skipped.
    pub async fn deduct_for_recipe(
        &self,
        user_id: Uuid,
        ingredients: &[Ingredient],
    ) -> Result<DeductionReport> {
        let mut tx = self.pool.begin().await?;
        let mut pantry = Self::list_in(&mut tx, user_id).await?;
        let mut report = DeductionReport::default();
        let now = Utc::now().to_rfc3339();

        for ingredient in ingredients {
            let skip = |reason: &str| SkippedIngredient {
                ingredient: ingredient.clone(),
                reason: reason.to_string(),
            };

            if ingredient.quantity <= 0.0 {
                report.skipped.push(skip("no quantity given"));
                continue;
            }

            let index = match find_best_match(&ingredient.name, &pantry) {
                Some((item, score)) if score >= STRONG_MATCH => {
                    pantry.iter().position(|p| p.id == item.id)
                }
                _ => None,
            };
            let Some(index) = index else {
                report.skipped.push(skip("not in pantry"));
                continue;
            };

            let item = &mut pantry[index];
            let needed = match convert(
                ingredient.quantity,
                &Unit::parse(&ingredient.unit),
                &Unit::parse(&item.unit),
            ) {
                Ok(amount) => amount,
                Err(e) => {
                    report.skipped.push(skip(&e.to_string()));
                    continue;
                }
            };

            let taken = needed.min(item.quantity);
            let remaining = item.quantity - taken;

            if remaining <= EMPTY_EPSILON {
                sqlx::query("DELETE FROM pantry_items WHERE id = ?")
                    .bind(item.id.to_string())
                    .execute(&mut *tx)
                    .await?;
            } else {
                sqlx::query("UPDATE pantry_items SET quantity = ?, updated_at = ? WHERE id = ?")
                    .bind(remaining)
                    .bind(&now)
                    .bind(item.id.to_string())
                    .execute(&mut *tx)
                    .await?;
            }

            report.deducted.push(Deduction {
                ingredient: ingredient.clone(),
                pantry_item_id: item.id,
                pantry_item_name: item.name.clone(),
                amount: taken,
                unit: item.unit.clone(),
                remaining: remaining.max(0.0),
            });

            if remaining <= EMPTY_EPSILON {
                pantry.remove(index);
            } else {
                item.quantity = remaining;
            }
        }

        tx.commit().await?;

        tracing::info!(
            user_id = %user_id,
            deducted = report.deducted.len(),
            skipped = report.skipped.len(),
            "deducted recipe from pantry"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::{create_user, test_db};

    #[tokio::test]
    async fn test_add_and_list_sorted() {
        let db = test_db().await;
        let user = create_user(&db.pool, "p@example.com", "P").await;
        let repo = PantryRepository::new(db.pool.clone());

        repo.add(user.id, "rice", 1.0, "kg").await.unwrap();
        repo.add(user.id, "eggs", 6.0, "").await.unwrap();

        let items = repo.list(user.id).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "eggs");
        assert_eq!(items[1].name, "rice");
    }

    #[tokio::test]
    async fn test_add_merges_comparable_units() {
        let db = test_db().await;
        let user = create_user(&db.pool, "m@example.com", "M").await;
        let repo = PantryRepository::new(db.pool.clone());

        let first = repo.add(user.id, "Flour", 1.0, "kg").await.unwrap();
        let merged = repo.add(user.id, "flour", 500.0, "g").await.unwrap();

        assert_eq!(merged.id, first.id);
        assert_eq!(merged.unit, "kg");
        assert!((merged.quantity - 1.5).abs() < 1e-9);
        assert_eq!(repo.list(user.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_keeps_incomparable_units_apart() {
        let db = test_db().await;
        let user = create_user(&db.pool, "i@example.com", "I").await;
        let repo = PantryRepository::new(db.pool.clone());

        repo.add(user.id, "milk", 1.0, "l").await.unwrap();
        repo.add(user.id, "milk", 2.0, "").await.unwrap();

        assert_eq!(repo.list(user.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_add_rejects_bad_input() {
        let db = test_db().await;
        let user = create_user(&db.pool, "b@example.com", "B").await;
        let repo = PantryRepository::new(db.pool.clone());

        assert!(matches!(
            repo.add(user.id, "  ", 1.0, "g").await,
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            repo.add(user.id, "salt", -1.0, "g").await,
            Err(Error::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_update_and_delete_are_user_scoped() {
        let db = test_db().await;
        let owner = create_user(&db.pool, "o@example.com", "O").await;
        let other = create_user(&db.pool, "x@example.com", "X").await;
        let repo = PantryRepository::new(db.pool.clone());

        let item = repo.add(owner.id, "butter", 250.0, "g").await.unwrap();

        assert!(repo
            .update(other.id, item.id, "butter", 1.0, "g")
            .await
            .unwrap()
            .is_none());
        assert!(!repo.delete(other.id, item.id).await.unwrap());

        let updated = repo
            .update(owner.id, item.id, "salted butter", 200.0, "g")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "salted butter");
        assert_eq!(updated.quantity, 200.0);

        assert!(repo.delete(owner.id, item.id).await.unwrap());
        assert!(repo.list(owner.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deduct_for_recipe() {
        let db = test_db().await;
        let user = create_user(&db.pool, "d@example.com", "D").await;
        let repo = PantryRepository::new(db.pool.clone());

        repo.add(user.id, "milk", 1.0, "l").await.unwrap();
        repo.add(user.id, "eggs", 2.0, "").await.unwrap();
        repo.add(user.id, "saffron", 1.0, "pinch").await.unwrap();

        let report = repo
            .deduct_for_recipe(
                user.id,
                &[
                    Ingredient::new("milk", 1.0, "cup"),
                    Ingredient::new("large eggs", 2.0, ""),
                    Ingredient::new("saffron", 1.0, "g"),
                    Ingredient::new("vanilla", 1.0, "tsp"),
                    Ingredient::new("salt", 0.0, ""),
                ],
            )
            .await
            .unwrap();

        assert_eq!(report.deducted.len(), 2);
        assert_eq!(report.skipped.len(), 3);

        let items = repo.list(user.id).await.unwrap();
        // eggs used up and removed
        assert!(items.iter().all(|i| i.name != "eggs"));
        let milk = items.iter().find(|i| i.name == "milk").unwrap();
        assert!((milk.quantity - (1.0 - 0.236588)).abs() < 1e-6);
        let saffron = items.iter().find(|i| i.name == "saffron").unwrap();
        assert_eq!(saffron.quantity, 1.0);
    }

    #[tokio::test]
    async fn test_deduct_never_goes_negative() {
        let db = test_db().await;
        let user = create_user(&db.pool, "n@example.com", "N").await;
        let repo = PantryRepository::new(db.pool.clone());

        repo.add(user.id, "sugar", 100.0, "g").await.unwrap();
        let report = repo
            .deduct_for_recipe(user.id, &[Ingredient::new("sugar", 250.0, "g")])
            .await
            .unwrap();

        assert_eq!(report.deducted[0].amount, 100.0);
        assert_eq!(report.deducted[0].remaining, 0.0);
        assert!(repo.list(user.id).await.unwrap().is_empty());
    }
}
