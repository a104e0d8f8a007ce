//! Client for TheMealDB-compatible public recipe APIs.
//!
//! Meals list their ingredients in numbered fields (`strIngredient1` ..
//! `strIngredient20` with matching `strMeasureN`), which are folded into
//! [`Ingredient`]s here.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use uuid::Uuid;

use crate::config::MealDbConfig;
use crate::models::{Ingredient, Recipe, RecipeSource};
use crate::units::parse_measure;

/// Highest numbered ingredient field a meal can carry.
const MAX_INGREDIENTS: usize = 20;

#[derive(Debug)]
pub enum MealDbError {
    /// Could not reach the service
    Request(String),
    /// Service answered with an error status
    Status(u16),
    /// Body was not the expected JSON
    Parse(String),
}

impl std::fmt::Display for MealDbError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MealDbError::Request(e) => write!(f, "Meal database request failed: {}", e),
            MealDbError::Status(status) => write!(f, "Meal database returned HTTP {}", status),
            MealDbError::Parse(e) => write!(f, "Unexpected meal database response: {}", e),
        }
    }
}

impl std::error::Error for MealDbError {}

/// Search result from the ingredient filter, which omits details.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MealSummary {
    pub id: String,
    pub name: String,
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Meal {
    pub id: String,
    pub name: String,
    pub category: Option<String>,
    pub area: Option<String>,
    pub instructions: Vec<String>,
    pub thumbnail: Option<String>,
    pub tags: Vec<String>,
    pub ingredients: Vec<Ingredient>,
}

impl Meal {
    /// Copies the meal into a personal recipe.
    pub fn into_recipe(self, user_id: Uuid) -> Recipe {
        let mut tags: Vec<String> = self
            .category
            .into_iter()
            .chain(self.area)
            .map(|t| t.to_lowercase())
            .collect();
        for tag in self.tags.into_iter().map(|t| t.to_lowercase()) {
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }

        let mut recipe = Recipe::new(self.name, user_id)
            .with_ingredients(self.ingredients)
            .with_instructions(self.instructions)
            .with_tags(tags)
            .with_source(RecipeSource::Imported);
        recipe.image_url = self.thumbnail;
        recipe
    }
}

#[derive(Deserialize)]
struct MealsResponse {
    /// `null` when nothing matched
    meals: Option<Vec<Map<String, Value>>>,
}

fn text_field(raw: &Map<String, Value>, key: &str) -> Option<String> {
    raw.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn split_instructions(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        // Some meals number their steps on a line of their own
        .filter(|line| {
            let lower = line.to_lowercase();
            let rest = lower.strip_prefix("step").unwrap_or(&lower).trim();
            !rest.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ':')
        })
        .map(str::to_string)
        .collect()
}

fn parse_meal(raw: &Map<String, Value>) -> Option<Meal> {
    let id = text_field(raw, "idMeal")?;
    let name = text_field(raw, "strMeal")?;

    let ingredients = (1..=MAX_INGREDIENTS)
        .filter_map(|n| {
            let name = text_field(raw, &format!("strIngredient{}", n))?;
            let measure = text_field(raw, &format!("strMeasure{}", n)).unwrap_or_default();
            let (quantity, unit) = if measure.is_empty() {
                (0.0, String::new())
            } else {
                parse_measure(&measure)
            };
            Some(Ingredient::new(name, quantity, unit))
        })
        .collect();

    Some(Meal {
        id,
        name,
        category: text_field(raw, "strCategory"),
        area: text_field(raw, "strArea"),
        instructions: text_field(raw, "strInstructions")
            .map(|text| split_instructions(&text))
            .unwrap_or_default(),
        thumbnail: text_field(raw, "strMealThumb"),
        tags: text_field(raw, "strTags")
            .map(|tags| {
                tags.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
        ingredients,
    })
}

fn parse_meals(body: &str) -> Result<Vec<Meal>, MealDbError> {
    let response: MealsResponse =
        serde_json::from_str(body).map_err(|e| MealDbError::Parse(e.to_string()))?;
    Ok(response
        .meals
        .unwrap_or_default()
        .iter()
        .filter_map(parse_meal)
        .collect())
}

fn parse_summaries(body: &str) -> Result<Vec<MealSummary>, MealDbError> {
    let response: MealsResponse =
        serde_json::from_str(body).map_err(|e| MealDbError::Parse(e.to_string()))?;
    Ok(response
        .meals
        .unwrap_or_default()
        .iter()
        .filter_map(|raw| {
            Some(MealSummary {
                id: text_field(raw, "idMeal")?,
                name: text_field(raw, "strMeal")?,
                thumbnail: text_field(raw, "strMealThumb"),
            })
        })
        .collect())
}

#[derive(Debug, Clone)]
pub struct MealDbClient {
    client: reqwest::Client,
    base_url: String,
}

impl MealDbClient {
    pub fn from_config(config: &MealDbConfig) -> Result<Self, MealDbError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| MealDbError::Request(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get(&self, path: &str) -> Result<String, MealDbError> {
        let url = format!("{}/{}", self.base_url, path);
        tracing::debug!(%url, "meal database request");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| MealDbError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MealDbError::Status(status.as_u16()));
        }
        response
            .text()
            .await
            .map_err(|e| MealDbError::Request(e.to_string()))
    }

    pub async fn search(&self, name: &str) -> Result<Vec<Meal>, MealDbError> {
        let body = self
            .get(&format!("search.php?s={}", urlencoding::encode(name.trim())))
            .await?;
        parse_meals(&body)
    }

    pub async fn filter_by_ingredient(
        &self,
        ingredient: &str,
    ) -> Result<Vec<MealSummary>, MealDbError> {
        // The API expects underscores between words ("chicken_breast")
        let ingredient = ingredient.trim().replace(' ', "_");
        let body = self
            .get(&format!("filter.php?i={}", urlencoding::encode(&ingredient)))
            .await?;
        parse_summaries(&body)
    }

    pub async fn lookup(&self, id: &str) -> Result<Option<Meal>, MealDbError> {
        let body = self
            .get(&format!("lookup.php?i={}", urlencoding::encode(id.trim())))
            .await?;
        Ok(parse_meals(&body)?.into_iter().next())
    }

    /// Like [`search`](Self::search), but failures yield an empty list.
    pub async fn search_or_empty(&self, name: &str) -> Vec<Meal> {
        self.search(name).await.unwrap_or_else(|e| {
            tracing::warn!(query = name, error = %e, "meal search failed");
            Vec::new()
        })
    }

    /// Like [`filter_by_ingredient`](Self::filter_by_ingredient), but failures
    /// yield an empty list.
    pub async fn filter_or_empty(&self, ingredient: &str) -> Vec<MealSummary> {
        self.filter_by_ingredient(ingredient)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(ingredient, error = %e, "meal ingredient filter failed");
                Vec::new()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_BODY: &str = r#"{
      "meals": [{
        "idMeal": "52772",
        "strMeal": "Teriyaki Chicken Casserole",
        "strCategory": "Chicken",
        "strArea": "Japanese",
        "strInstructions": "STEP 1\r\nPreheat oven to 350.\r\n\r\nSTEP 2\r\nCombine soy sauce and water.",
        "strMealThumb": "https://www.themealdb.com/images/media/meals/wvpsxx1468256321.jpg",
        "strTags": "Meat,Casserole",
        "strIngredient1": "soy sauce",
        "strMeasure1": "3/4 cup",
        "strIngredient2": "water",
        "strMeasure2": "1/2 cup",
        "strIngredient3": "chicken breasts",
        "strMeasure3": "2",
        "strIngredient4": "stir-fry vegetables",
        "strMeasure4": "1 (12 oz.)",
        "strIngredient5": "salt",
        "strMeasure5": " ",
        "strIngredient6": "",
        "strMeasure6": "",
        "strIngredient7": null,
        "strMeasure7": null
      }]
    }"#;

    #[test]
    fn test_parse_meal_fields() {
        let meals = parse_meals(SEARCH_BODY).unwrap();
        assert_eq!(meals.len(), 1);
        let meal = &meals[0];
        assert_eq!(meal.id, "52772");
        assert_eq!(meal.category.as_deref(), Some("Chicken"));
        assert_eq!(meal.tags, vec!["Meat", "Casserole"]);
        assert_eq!(
            meal.instructions,
            vec!["Preheat oven to 350.", "Combine soy sauce and water."]
        );
    }

    #[test]
    fn test_parse_numbered_ingredients() {
        let meal = parse_meals(SEARCH_BODY).unwrap().remove(0);
        assert_eq!(meal.ingredients.len(), 5);
        assert_eq!(meal.ingredients[0].name, "soy sauce");
        assert_eq!(meal.ingredients[0].quantity, 0.75);
        assert_eq!(meal.ingredients[0].unit, "cup");
        assert_eq!(meal.ingredients[2].quantity, 2.0);
        assert_eq!(meal.ingredients[2].unit, "");
        // blank measure
        assert_eq!(meal.ingredients[4].quantity, 0.0);
    }

    #[test]
    fn test_no_matches_is_empty() {
        assert!(parse_meals(r#"{"meals": null}"#).unwrap().is_empty());
        assert!(parse_summaries(r#"{"meals": null}"#).unwrap().is_empty());
        assert!(matches!(parse_meals("<html>"), Err(MealDbError::Parse(_))));
    }

    #[test]
    fn test_parse_summaries() {
        let body = r#"{"meals":[{"strMeal":"Brown Stew Chicken","strMealThumb":"x.jpg","idMeal":"52940"}]}"#;
        let summaries = parse_summaries(body).unwrap();
        assert_eq!(
            summaries,
            vec![MealSummary {
                id: "52940".into(),
                name: "Brown Stew Chicken".into(),
                thumbnail: Some("x.jpg".into()),
            }]
        );
    }

    #[test]
    fn test_into_recipe() {
        let user = Uuid::new_v4();
        let recipe = parse_meals(SEARCH_BODY).unwrap().remove(0).into_recipe(user);
        assert_eq!(recipe.title, "Teriyaki Chicken Casserole");
        assert_eq!(recipe.source, RecipeSource::Imported);
        assert_eq!(recipe.tags, vec!["chicken", "japanese", "meat", "casserole"]);
        assert!(recipe.image_url.is_some());
        assert_eq!(recipe.ingredients.len(), 5);
    }

    #[tokio::test]
    async fn test_unreachable_service_falls_back_to_empty() {
        let client = MealDbClient::from_config(&MealDbConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 2,
        })
        .unwrap();
        assert!(client.search_or_empty("chicken").await.is_empty());
        assert!(client.filter_or_empty("garlic").await.is_empty());
        assert!(client.lookup("1").await.is_err());
    }
}
