//! Typed readers for the JSON objects the prompts ask the model for.
//!
//! Models often wrap JSON in markdown fences or add a sentence before it, so
//! the outermost `{ ... }` is extracted first. Anything that still doesn't
//! match the expected shape is a [`LlmError::MalformedResponse`].

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::LlmError;
use crate::models::{parse_minutes, Ingredient, Recipe, RecipeSource};
use crate::units::parse_measure;

/// Returns the outermost JSON object in a completion.
pub fn extract_json(text: &str) -> Result<&str, LlmError> {
    let start = text.find('{');
    let end = text.rfind('}');
    match (start, end) {
        (Some(start), Some(end)) if start < end => Ok(&text[start..=end]),
        _ => Err(LlmError::MalformedResponse(
            "no JSON object in completion".to_string(),
        )),
    }
}

pub fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T, LlmError> {
    let json = extract_json(text)?;
    serde_json::from_str(json).map_err(|e| LlmError::MalformedResponse(e.to_string()))
}

/// Accepts `2`, `2.5`, `"2"` or `"1 1/2"` for a quantity.
fn lenient_quantity<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
        Missing(Option<()>),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) if n.is_finite() && n >= 0.0 => Ok(n),
        Raw::Number(n) => Err(de::Error::custom(format!("invalid quantity {}", n))),
        Raw::Text(text) if text.trim().is_empty() => Ok(0.0),
        Raw::Text(text) => Ok(parse_measure(&text).0),
        Raw::Missing(_) => Ok(0.0),
    }
}

/// Accepts `15`, `7.5` (rounded), `"5 mins"` or `"1 hr 10 min"` for a duration.
/// Null, negative or unreadable values become `None`.
fn lenient_minutes<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
        Other(de::IgnoredAny),
    }

    let minutes = match Raw::deserialize(deserializer)? {
        Raw::Number(n) if n.is_finite() && n >= 0.0 => Some(n.round() as i64),
        Raw::Number(_) | Raw::Other(_) => None,
        Raw::Text(text) => parse_minutes(&text).map(i64::from),
    };
    Ok(minutes.and_then(|m| i32::try_from(m).ok()))
}

#[derive(Debug, Clone, Deserialize)]
struct RawIngredient {
    name: String,
    #[serde(default, deserialize_with = "lenient_quantity")]
    quantity: f64,
    #[serde(default)]
    unit: Option<String>,
}

impl From<RawIngredient> for Ingredient {
    fn from(raw: RawIngredient) -> Self {
        Ingredient::new(raw.name.trim(), raw.quantity, raw.unit.unwrap_or_default().trim())
    }
}

fn deserialize_ingredients<'de, D>(deserializer: D) -> Result<Vec<Ingredient>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<RawIngredient> = Vec::deserialize(deserializer)?;
    Ok(raw.into_iter().map(Ingredient::from).collect())
}

/// A recipe proposed by the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneratedRecipe {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(deserialize_with = "deserialize_ingredients")]
    pub ingredients: Vec<Ingredient>,
    pub instructions: Vec<String>,
    #[serde(default, deserialize_with = "lenient_minutes")]
    pub prep_time: Option<i32>,
    #[serde(default, deserialize_with = "lenient_minutes")]
    pub cook_time: Option<i32>,
    #[serde(default)]
    pub servings: Option<i32>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl GeneratedRecipe {
    fn validate(&self) -> Result<(), LlmError> {
        if self.title.trim().is_empty() {
            return Err(LlmError::MalformedResponse(
                "generated recipe has no title".to_string(),
            ));
        }
        if self.ingredients.is_empty() || self.ingredients.iter().any(|i| i.name.is_empty()) {
            return Err(LlmError::MalformedResponse(format!(
                "generated recipe '{}' has missing ingredients",
                self.title
            )));
        }
        if self.instructions.iter().all(|step| step.trim().is_empty()) {
            return Err(LlmError::MalformedResponse(format!(
                "generated recipe '{}' has no instructions",
                self.title
            )));
        }
        Ok(())
    }

    pub fn into_recipe(self, user_id: Uuid) -> Recipe {
        let mut recipe = Recipe::new(self.title.trim(), user_id)
            .with_description(self.description)
            .with_ingredients(self.ingredients)
            .with_instructions(
                self.instructions
                    .into_iter()
                    .filter(|step| !step.trim().is_empty())
                    .collect(),
            )
            .with_tags(self.tags)
            .with_source(RecipeSource::Generated);
        recipe.prep_time = self.prep_time;
        recipe.cook_time = self.cook_time;
        recipe.servings = self.servings;
        recipe
    }
}

#[derive(Deserialize)]
struct GeneratedRecipes {
    recipes: Vec<GeneratedRecipe>,
}

pub fn parse_generated_recipes(text: &str) -> Result<Vec<GeneratedRecipe>, LlmError> {
    let parsed: GeneratedRecipes = parse_json(text)?;
    if parsed.recipes.is_empty() {
        return Err(LlmError::MalformedResponse(
            "completion contained no recipes".to_string(),
        ));
    }
    for recipe in &parsed.recipes {
        recipe.validate()?;
    }
    Ok(parsed.recipes)
}

/// A replacement for one ingredient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Substitute {
    pub name: String,
    /// e.g. "1:1" or "3/4 cup per cup"
    #[serde(default)]
    pub ratio: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Deserialize)]
struct Substitutes {
    substitutes: Vec<Substitute>,
}

pub fn parse_substitutes(text: &str) -> Result<Vec<Substitute>, LlmError> {
    let parsed: Substitutes = parse_json(text)?;
    Ok(parsed
        .substitutes
        .into_iter()
        .filter(|s| !s.name.trim().is_empty())
        .collect())
}

/// A pantry-based stand-in for a missing recipe ingredient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Alternative {
    pub missing: String,
    pub use_instead: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Deserialize)]
struct Alternatives {
    alternatives: Vec<Alternative>,
}

pub fn parse_alternatives(text: &str) -> Result<Vec<Alternative>, LlmError> {
    let parsed: Alternatives = parse_json(text)?;
    Ok(parsed.alternatives)
}

/// An ingredient recognized in an uploaded photo.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectedIngredient {
    pub name: String,
    #[serde(default, deserialize_with = "lenient_quantity")]
    pub quantity: f64,
    #[serde(default)]
    pub unit: String,
}

#[derive(Deserialize)]
struct DetectedIngredients {
    ingredients: Vec<DetectedIngredient>,
}

pub fn parse_detected_ingredients(text: &str) -> Result<Vec<DetectedIngredient>, LlmError> {
    let parsed: DetectedIngredients = parse_json(text)?;
    Ok(parsed
        .ingredients
        .into_iter()
        .filter(|i| !i.name.trim().is_empty())
        .map(|mut i| {
            i.name = i.name.trim().to_string();
            if i.quantity <= 0.0 {
                i.quantity = 1.0;
            }
            i
        })
        .collect())
}
