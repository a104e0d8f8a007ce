//! Prompt builders for each AI-backed endpoint.
//!
//! Every prompt spells out the exact JSON object expected back, matching the
//! readers in [`super::parse`].

use std::fmt::Write;

use super::{CompletionRequest, ImageInput};
use crate::models::{DietaryPreferences, Ingredient, PantryItem};

const CHEF_SYSTEM: &str = "You are a practical home-cooking assistant. \
Answer only with a single JSON object, no prose and no markdown.";

const RECIPE_SHAPE: &str = r#"{"recipes":[{"title":string,"description":string,"ingredients":[{"name":string,"quantity":number,"unit":string}],"instructions":[string],"prep_time":integer minutes,"cook_time":integer minutes,"servings":integer,"tags":[string]}]}"#;

/// Extra knobs for recipe generation.
#[derive(Debug, Clone, Default)]
pub struct GenerationOptions {
    pub count: u8,
    pub cuisine: Option<String>,
    pub max_minutes: Option<u32>,
    pub notes: Option<String>,
}

fn list_ingredients(out: &mut String, items: &[Ingredient]) {
    for item in items {
        let _ = writeln!(out, "- {}", item);
    }
}

fn list_restrictions(out: &mut String, preferences: &DietaryPreferences) {
    let restrictions = preferences.restrictions();
    if restrictions.is_empty() {
        out.push_str("Dietary restrictions: none.\n");
    } else {
        let _ = writeln!(
            out,
            "Dietary restrictions (must be respected): {}.",
            restrictions.join(", ")
        );
    }
}

pub fn pantry_as_ingredients(pantry: &[PantryItem]) -> Vec<Ingredient> {
    pantry
        .iter()
        .map(|item| Ingredient::new(item.name.clone(), item.quantity, item.unit.clone()))
        .collect()
}

pub fn recipe_generation(
    inventory: &[Ingredient],
    preferences: &DietaryPreferences,
    options: &GenerationOptions,
) -> CompletionRequest {
    let count = options.count.max(1);
    let mut prompt = String::new();
    let _ = writeln!(
        prompt,
        "Suggest {} recipe(s) that can be cooked mainly from this pantry:",
        count
    );
    list_ingredients(&mut prompt, inventory);
    prompt.push('\n');
    list_restrictions(&mut prompt, preferences);
    if let Some(cuisine) = &options.cuisine {
        let _ = writeln!(prompt, "Preferred cuisine: {}.", cuisine);
    }
    if let Some(max) = options.max_minutes {
        let _ = writeln!(prompt, "Total time (prep + cook) must not exceed {} minutes.", max);
    }
    if let Some(notes) = &options.notes {
        let _ = writeln!(prompt, "Additional notes from the cook: {}", notes);
    }
    prompt.push_str(
        "Prefer pantry ingredients; basic staples (salt, pepper, oil, water) may be assumed. \
Use metric or US units with numeric quantities.\n",
    );
    let _ = write!(prompt, "Respond with JSON shaped exactly like: {}", RECIPE_SHAPE);

    CompletionRequest::new(CHEF_SYSTEM, prompt)
        .with_temperature(0.7)
        .with_max_tokens(2500)
}

pub fn ingredient_substitutes(
    ingredient: &str,
    recipe_title: Option<&str>,
    pantry: &[PantryItem],
    preferences: &DietaryPreferences,
) -> CompletionRequest {
    let mut prompt = String::new();
    match recipe_title {
        Some(title) => {
            let _ = writeln!(
                prompt,
                "Suggest up to 5 substitutes for \"{}\" in the recipe \"{}\".",
                ingredient, title
            );
        }
        None => {
            let _ = writeln!(prompt, "Suggest up to 5 substitutes for \"{}\".", ingredient);
        }
    }
    if !pantry.is_empty() {
        prompt.push_str("Prefer items from this pantry when they work:\n");
        list_ingredients(&mut prompt, &pantry_as_ingredients(pantry));
    }
    list_restrictions(&mut prompt, preferences);
    prompt.push_str(
        r#"Respond with JSON shaped exactly like: {"substitutes":[{"name":string,"ratio":string,"notes":string}]}"#,
    );

    CompletionRequest::new(CHEF_SYSTEM, prompt)
        .with_temperature(0.4)
        .with_max_tokens(800)
}

pub fn missing_alternatives(
    recipe_title: &str,
    missing: &[Ingredient],
    pantry: &[PantryItem],
    preferences: &DietaryPreferences,
) -> CompletionRequest {
    let mut prompt = String::new();
    let _ = writeln!(
        prompt,
        "I want to cook \"{}\" but I'm missing these ingredients:",
        recipe_title
    );
    list_ingredients(&mut prompt, missing);
    prompt.push_str("\nThis is what I have:\n");
    list_ingredients(&mut prompt, &pantry_as_ingredients(pantry));
    prompt.push('\n');
    list_restrictions(&mut prompt, preferences);
    prompt.push_str(
        "For each missing ingredient, suggest what from my pantry to use instead, \
or say to omit it if nothing fits.\n",
    );
    prompt.push_str(
        r#"Respond with JSON shaped exactly like: {"alternatives":[{"missing":string,"use_instead":string,"notes":string}]}"#,
    );

    CompletionRequest::new(CHEF_SYSTEM, prompt)
        .with_temperature(0.4)
        .with_max_tokens(800)
}

pub fn ingredient_detection(image: ImageInput) -> CompletionRequest {
    let prompt = concat!(
        "List the food ingredients visible in this photo with an estimated quantity and unit. ",
        "Ignore non-food objects. ",
        r#"Respond with JSON shaped exactly like: {"ingredients":[{"name":string,"quantity":number,"unit":string}]}"#
    );

    CompletionRequest::new(CHEF_SYSTEM, prompt)
        .with_image(image)
        .with_temperature(0.1)
        .with_max_tokens(600)
}
