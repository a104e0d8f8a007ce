use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use super::{cascade, from_json, parse_id, parse_timestamp, to_json};
use crate::models::{Ingredient, Recipe};

pub struct RecipeRepository {
    pool: SqlitePool,
}

// Row types for database queries
#[derive(sqlx::FromRow)]
struct RecipeRow {
    id: String,
    user_id: String,
    title: String,
    description: String,
    instructions: String,
    prep_time: Option<i32>,
    cook_time: Option<i32>,
    servings: Option<i32>,
    tags: String,
    image_url: Option<String>,
    source: String,
    created_at: String,
    updated_at: String,
}

#[derive(sqlx::FromRow)]
struct IngredientRow {
    name: String,
    quantity: f64,
    unit: String,
}

impl RecipeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, recipe: &Recipe) -> Result<Recipe, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        insert_recipe(&mut tx, recipe).await?;
        tx.commit().await?;

        tracing::debug!(recipe_id = %recipe.id, title = %recipe.title, "created recipe");

        // Return the created recipe
        self.get_by_id(recipe.id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Inserts several recipes in one transaction; either all are stored or none.
    pub async fn create_many(&self, recipes: &[Recipe]) -> Result<Vec<Recipe>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        for recipe in recipes {
            insert_recipe(&mut tx, recipe).await?;
        }
        tx.commit().await?;

        tracing::debug!(count = recipes.len(), "created recipes");

        let mut created = Vec::with_capacity(recipes.len());
        for recipe in recipes {
            created.push(
                self.get_by_id(recipe.id)
                    .await?
                    .ok_or(sqlx::Error::RowNotFound)?,
            );
        }
        Ok(created)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Recipe>, sqlx::Error> {
        let row: Option<RecipeRow> = sqlx::query_as("SELECT * FROM recipes WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => self.hydrate_recipe(row).await.map(Some),
            None => Ok(None),
        }
    }

    /// A recipe only if `user_id` owns it.
    pub async fn get_owned(&self, user_id: Uuid, id: Uuid) -> Result<Option<Recipe>, sqlx::Error> {
        Ok(self
            .get_by_id(id)
            .await?
            .filter(|recipe| recipe.user_id == user_id))
    }

    /// Case-insensitive title lookup within a user's recipes.
    pub async fn get_by_title(
        &self,
        user_id: Uuid,
        title: &str,
    ) -> Result<Option<Recipe>, sqlx::Error> {
        let row: Option<RecipeRow> = sqlx::query_as(
            "SELECT * FROM recipes WHERE user_id = ? AND LOWER(title) = LOWER(?) ORDER BY created_at LIMIT 1",
        )
        .bind(user_id.to_string())
        .bind(title)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => self.hydrate_recipe(row).await.map(Some),
            None => Ok(None),
        }
    }

    /// A user's recipes, newest first.
    pub async fn list(&self, user_id: Uuid) -> Result<Vec<Recipe>, sqlx::Error> {
        let rows: Vec<RecipeRow> =
            sqlx::query_as("SELECT * FROM recipes WHERE user_id = ? ORDER BY created_at DESC")
                .bind(user_id.to_string())
                .fetch_all(&self.pool)
                .await?;

        let mut recipes = Vec::with_capacity(rows.len());
        for row in rows {
            recipes.push(self.hydrate_recipe(row).await?);
        }
        Ok(recipes)
    }

    /// Deletes an owned recipe and then its shared copies.
    ///
    /// Returns `None` when the recipe doesn't exist or belongs to someone
    /// else, otherwise the number of shared copies that were removed.
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<Option<u64>, sqlx::Error> {
        // CASCADE will handle ingredients
        let result = sqlx::query("DELETE FROM recipes WHERE id = ? AND user_id = ?")
            .bind(id.to_string())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(Some(cascade::on_recipe_deleted(&self.pool, id).await))
    }

    pub async fn add_ingredient(
        &self,
        recipe_id: Uuid,
        ingredient: &Ingredient,
    ) -> Result<(), sqlx::Error> {
        let id_str = recipe_id.to_string();
        let mut tx = self.pool.begin().await?;

        let (next,): (i64,) = sqlx::query_as(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM recipe_ingredients WHERE recipe_id = ?",
        )
        .bind(&id_str)
        .fetch_one(&mut *tx)
        .await?;

        insert_ingredients(&mut tx, &id_str, next, std::slice::from_ref(ingredient)).await?;

        sqlx::query("UPDATE recipes SET updated_at = ? WHERE id = ?")
            .bind(Utc::now().to_rfc3339())
            .bind(&id_str)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn hydrate_recipe(&self, row: RecipeRow) -> Result<Recipe, sqlx::Error> {
        let ingredients: Vec<IngredientRow> = sqlx::query_as(
            "SELECT name, quantity, unit FROM recipe_ingredients WHERE recipe_id = ? ORDER BY position",
        )
        .bind(&row.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Recipe {
            id: parse_id(&row.id)?,
            user_id: parse_id(&row.user_id)?,
            title: row.title,
            description: row.description,
            ingredients: ingredients
                .into_iter()
                .map(|i| Ingredient::new(i.name, i.quantity, i.unit))
                .collect(),
            instructions: from_json(&row.instructions),
            prep_time: row.prep_time,
            cook_time: row.cook_time,
            servings: row.servings,
            tags: from_json(&row.tags),
            image_url: row.image_url,
            source: row.source.parse().unwrap_or_default(),
            created_at: parse_timestamp(&row.created_at),
            updated_at: parse_timestamp(&row.updated_at),
        })
    }
}

async fn insert_recipe(
    tx: &mut Transaction<'_, Sqlite>,
    recipe: &Recipe,
) -> Result<(), sqlx::Error> {
    let id = recipe.id.to_string();

    sqlx::query(
        r#"
        INSERT INTO recipes (id, user_id, title, description, instructions, prep_time, cook_time, servings, tags, image_url, source, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(recipe.user_id.to_string())
    .bind(&recipe.title)
    .bind(&recipe.description)
    .bind(to_json(&recipe.instructions))
    .bind(recipe.prep_time)
    .bind(recipe.cook_time)
    .bind(recipe.servings)
    .bind(to_json(&recipe.tags))
    .bind(&recipe.image_url)
    .bind(recipe.source.to_string())
    .bind(recipe.created_at.to_rfc3339())
    .bind(recipe.updated_at.to_rfc3339())
    .execute(&mut **tx)
    .await?;

    insert_ingredients(tx, &id, 0, &recipe.ingredients).await
}

async fn insert_ingredients(
    tx: &mut Transaction<'_, Sqlite>,
    recipe_id: &str,
    first_position: i64,
    ingredients: &[Ingredient],
) -> Result<(), sqlx::Error> {
    for (offset, ingredient) in ingredients.iter().enumerate() {
        sqlx::query(
            "INSERT INTO recipe_ingredients (recipe_id, position, name, quantity, unit) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(recipe_id)
        .bind(first_position + offset as i64)
        .bind(&ingredient.name)
        .bind(ingredient.quantity)
        .bind(&ingredient.unit)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::{create_user, test_db};
    use crate::db::SharedRecipeRepository;
    use crate::models::RecipeSource;

    #[tokio::test]
    async fn test_create_and_get_recipe() {
        let db = test_db().await;
        let user = create_user(&db.pool, "c@example.com", "C").await;
        let repo = RecipeRepository::new(db.pool.clone());

        let recipe = Recipe::new("Test Pasta", user.id)
            .with_ingredients(vec![
                Ingredient::new("pasta", 200.0, "g"),
                Ingredient::new("sauce", 1.0, "cup"),
            ])
            .with_instructions(vec!["Boil pasta.".into(), "Add sauce.".into()])
            .with_prep_time(5)
            .with_cook_time(15)
            .with_servings(2)
            .with_tags(vec!["italian".into(), "quick".into()])
            .with_source(RecipeSource::Generated);

        let created = repo.create(&recipe).await.unwrap();
        assert_eq!(created.title, "Test Pasta");
        assert_eq!(created.ingredients.len(), 2);

        let fetched = repo.get_by_id(recipe.id).await.unwrap().unwrap();
        assert_eq!(fetched.ingredients[0].name, "pasta");
        assert_eq!(fetched.ingredients[1].name, "sauce");
        assert_eq!(fetched.instructions, vec!["Boil pasta.", "Add sauce."]);
        assert_eq!(fetched.tags, vec!["italian", "quick"]);
        assert_eq!(fetched.source, RecipeSource::Generated);
        assert_eq!(fetched.total_time(), Some(20));
    }

    #[tokio::test]
    async fn test_create_many_is_all_or_nothing() {
        let db = test_db().await;
        let user = create_user(&db.pool, "c@example.com", "C").await;
        let repo = RecipeRepository::new(db.pool.clone());

        let soup = Recipe::new("Soup", user.id)
            .with_ingredients(vec![Ingredient::new("leek", 2.0, "")]);
        let salad = Recipe::new("Salad", user.id);
        let created = repo.create_many(&[soup.clone(), salad]).await.unwrap();
        assert_eq!(created.len(), 2);
        assert_eq!(created[0].ingredients[0].name, "leek");

        // Reusing the soup's id fails on the second insert
        let stew = Recipe::new("Stew", user.id);
        let mut duplicate = Recipe::new("Soup again", user.id);
        duplicate.id = soup.id;
        assert!(repo.create_many(&[stew.clone(), duplicate]).await.is_err());

        assert!(repo.get_by_id(stew.id).await.unwrap().is_none());
        assert_eq!(repo.list(user.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_get_owned_and_by_title() {
        let db = test_db().await;
        let owner = create_user(&db.pool, "o@example.com", "O").await;
        let other = create_user(&db.pool, "x@example.com", "X").await;
        let repo = RecipeRepository::new(db.pool.clone());

        let recipe = repo
            .create(&Recipe::new("Chicken Curry", owner.id))
            .await
            .unwrap();

        assert!(repo.get_owned(owner.id, recipe.id).await.unwrap().is_some());
        assert!(repo.get_owned(other.id, recipe.id).await.unwrap().is_none());

        let found = repo.get_by_title(owner.id, "CHICKEN curry").await.unwrap();
        assert_eq!(found.unwrap().id, recipe.id);
        assert!(repo
            .get_by_title(other.id, "chicken curry")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_list_is_user_scoped() {
        let db = test_db().await;
        let a = create_user(&db.pool, "a@example.com", "A").await;
        let b = create_user(&db.pool, "b@example.com", "B").await;
        let repo = RecipeRepository::new(db.pool.clone());

        repo.create(&Recipe::new("One", a.id)).await.unwrap();
        repo.create(&Recipe::new("Two", a.id)).await.unwrap();
        repo.create(&Recipe::new("Three", b.id)).await.unwrap();

        assert_eq!(repo.list(a.id).await.unwrap().len(), 2);
        assert_eq!(repo.list(b.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_ingredient_appends() {
        let db = test_db().await;
        let user = create_user(&db.pool, "i@example.com", "I").await;
        let repo = RecipeRepository::new(db.pool.clone());

        let recipe = Recipe::new("Soup", user.id)
            .with_ingredients(vec![Ingredient::new("water", 1.0, "l")]);
        repo.create(&recipe).await.unwrap();

        repo.add_ingredient(recipe.id, &Ingredient::new("salt", 1.0, "tsp"))
            .await
            .unwrap();

        let fetched = repo.get_by_id(recipe.id).await.unwrap().unwrap();
        assert_eq!(fetched.ingredients.len(), 2);
        assert_eq!(fetched.ingredients[1].name, "salt");
    }

    #[tokio::test]
    async fn test_delete_fires_cascade() {
        let db = test_db().await;
        let user = create_user(&db.pool, "d@example.com", "D").await;
        let repo = RecipeRepository::new(db.pool.clone());
        let shared_repo = SharedRecipeRepository::new(db.pool.clone());

        let recipe = repo
            .create(&Recipe::new("To Delete", user.id).with_ingredients(vec![
                Ingredient::new("item", 1.0, ""),
            ]))
            .await
            .unwrap();
        let shared = shared_repo.share(&recipe, "D").await.unwrap();

        let other = create_user(&db.pool, "x@example.com", "X").await;
        assert_eq!(repo.delete(other.id, recipe.id).await.unwrap(), None);

        assert_eq!(repo.delete(user.id, recipe.id).await.unwrap(), Some(1));
        assert!(repo.get_by_id(recipe.id).await.unwrap().is_none());
        assert!(shared_repo.get(shared.id).await.unwrap().is_none());

        assert_eq!(repo.delete(user.id, recipe.id).await.unwrap(), None);
    }
}
