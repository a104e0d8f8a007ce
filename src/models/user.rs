use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Dietary flags used when generating recipes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DietaryPreferences {
    pub vegetarian: bool,
    pub vegan: bool,
    pub gluten_free: bool,
    pub dairy_free: bool,
    pub nut_free: bool,
    /// Free-text allergies, e.g. "shellfish".
    pub allergies: Vec<String>,
}

impl DietaryPreferences {
    /// Human-readable restrictions, in a stable order.
    pub fn restrictions(&self) -> Vec<String> {
        let mut out: Vec<String> = [
            (self.vegan, "vegan"),
            (self.vegetarian && !self.vegan, "vegetarian"),
            (self.gluten_free, "gluten-free"),
            (self.dairy_free, "dairy-free"),
            (self.nut_free, "nut-free"),
        ]
        .into_iter()
        .filter(|(on, _)| *on)
        .map(|(_, label)| label.to_string())
        .collect();

        for allergy in &self.allergies {
            let allergy = allergy.trim();
            if !allergy.is_empty() {
                out.push(format!("no {}", allergy));
            }
        }
        out
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub preferences: DietaryPreferences,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            display_name: display_name.into(),
            preferences: DietaryPreferences::default(),
            created_at: Utc::now(),
        }
    }
}
