use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ingredient::Ingredient;
use super::time_category::TimeCategory;

/// Where a personal recipe came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecipeSource {
    #[default]
    Manual,
    Generated,
    Imported,
}

impl fmt::Display for RecipeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecipeSource::Manual => write!(f, "manual"),
            RecipeSource::Generated => write!(f, "generated"),
            RecipeSource::Imported => write!(f, "imported"),
        }
    }
}

impl FromStr for RecipeSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "manual" => Ok(RecipeSource::Manual),
            "generated" => Ok(RecipeSource::Generated),
            "imported" => Ok(RecipeSource::Imported),
            _ => Err(format!("Invalid recipe source '{}'", s)),
        }
    }
}

/// A recipe owned by one user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recipe {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub ingredients: Vec<Ingredient>,
    pub instructions: Vec<String>,
    pub prep_time: Option<i32>, // minutes
    pub cook_time: Option<i32>, // minutes
    pub servings: Option<i32>,
    pub tags: Vec<String>,
    pub image_url: Option<String>,
    pub source: RecipeSource,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Recipe {
    pub fn new(title: impl Into<String>, user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: title.into(),
            description: String::new(),
            ingredients: Vec::new(),
            instructions: Vec::new(),
            prep_time: None,
            cook_time: None,
            servings: None,
            tags: Vec::new(),
            image_url: None,
            source: RecipeSource::Manual,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_ingredients(mut self, ingredients: Vec<Ingredient>) -> Self {
        self.ingredients = ingredients;
        self
    }

    pub fn with_instructions(mut self, instructions: Vec<String>) -> Self {
        self.instructions = instructions;
        self
    }

    pub fn with_prep_time(mut self, minutes: i32) -> Self {
        self.prep_time = Some(minutes);
        self
    }

    pub fn with_cook_time(mut self, minutes: i32) -> Self {
        self.cook_time = Some(minutes);
        self
    }

    pub fn with_servings(mut self, servings: i32) -> Self {
        self.servings = Some(servings);
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_source(mut self, source: RecipeSource) -> Self {
        self.source = source;
        self
    }

    pub fn total_time(&self) -> Option<i32> {
        total_time(self.prep_time, self.cook_time)
    }

    pub fn time_category(&self) -> Option<TimeCategory> {
        self.total_time()
            .map(|minutes| TimeCategory::classify(minutes.max(0) as u32))
    }
}

pub(crate) fn total_time(prep: Option<i32>, cook: Option<i32>) -> Option<i32> {
    match (prep, cook) {
        (Some(prep), Some(cook)) => Some(prep + cook),
        (Some(prep), None) => Some(prep),
        (None, Some(cook)) => Some(cook),
        (None, None) => None,
    }
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f, "{}", "=".repeat(self.title.len()))?;

        if !self.description.is_empty() {
            writeln!(f, "{}", self.description)?;
        }

        if let Some(servings) = self.servings {
            writeln!(f, "Servings: {}", servings)?;
        }

        if let Some(total) = self.total_time() {
            let parts: Vec<String> = [
                self.prep_time.map(|t| format!("prep: {} min", t)),
                self.cook_time.map(|t| format!("cook: {} min", t)),
            ]
            .into_iter()
            .flatten()
            .collect();
            writeln!(f, "Time: {} min ({})", total, parts.join(", "))?;
        }

        if !self.tags.is_empty() {
            writeln!(f, "Tags: {}", self.tags.join(", "))?;
        }

        if !self.ingredients.is_empty() {
            writeln!(f, "\nIngredients:")?;
            for ingredient in &self.ingredients {
                writeln!(f, "  - {}", ingredient)?;
            }
        }

        if !self.instructions.is_empty() {
            writeln!(f, "\nInstructions:")?;
            for (i, step) in self.instructions.iter().enumerate() {
                writeln!(f, "  {}. {}", i + 1, step)?;
            }
        }

        Ok(())
    }
}
