//! Scores recipes against a pantry by ingredient name overlap.

use serde::Serialize;
use std::collections::HashSet;
use uuid::Uuid;

use crate::models::{Ingredient, PantryItem, Recipe};
use crate::units::{compare, Comparison, Quantity};

/// Minimum similarity for a pantry item to count as a match at all.
pub const MATCH_THRESHOLD: f64 = 0.5;
/// Similarity at or above which a match is treated as the same ingredient.
pub const STRONG_MATCH: f64 = 0.85;

/// Preparation and size words that don't change what the ingredient is.
const DESCRIPTORS: &[&str] = &[
    "a", "an", "the", "of", "and", "or", "to", "taste", "optional", "fresh", "freshly",
    "chopped", "diced", "minced", "sliced", "grated", "shredded", "crushed", "peeled",
    "finely", "roughly", "thinly", "large", "small", "medium", "whole", "raw", "organic",
    "boneless", "skinless", "cooked", "frozen", "canned", "dried", "ground", "ripe",
];

/// Lowercases, strips punctuation and descriptors, and singularizes words.
pub fn normalize_name(name: &str) -> String {
    let cleaned: String = name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    cleaned
        .split_whitespace()
        .filter(|word| !DESCRIPTORS.contains(word))
        .map(singularize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn singularize(word: &str) -> String {
    if word.len() <= 3 {
        return word.to_string();
    }
    if let Some(stem) = word.strip_suffix("ies") {
        return format!("{}y", stem);
    }
    if let Some(stem) = word.strip_suffix("oes") {
        return format!("{}o", stem);
    }
    for suffix in ["ches", "shes", "xes", "sses"] {
        if word.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    if word.ends_with('s') && !word.ends_with("ss") && !word.ends_with("us") && !word.ends_with("is")
    {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}

/// Similarity of two ingredient names in `[0, 1]`.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = normalize_name(a);
    let b = normalize_name(b);
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }

    let a_words: Vec<&str> = a.split_whitespace().collect();
    let b_words: Vec<&str> = b.split_whitespace().collect();
    let (short, long) = if a_words.len() <= b_words.len() {
        (&a_words, &b_words)
    } else {
        (&b_words, &a_words)
    };
    if long.windows(short.len()).any(|window| window == short.as_slice()) {
        return STRONG_MATCH;
    }

    let a_set: HashSet<&str> = a_words.iter().copied().collect();
    let b_set: HashSet<&str> = b_words.iter().copied().collect();
    let shared = a_set.intersection(&b_set).count();
    let union = a_set.union(&b_set).count();
    if union == 0 {
        0.0
    } else {
        shared as f64 / union as f64
    }
}

/// Best pantry item for an ingredient name, with its similarity score.
pub fn find_best_match<'a>(name: &str, pantry: &'a [PantryItem]) -> Option<(&'a PantryItem, f64)> {
    let mut best: Option<(&PantryItem, f64)> = None;
    for item in pantry {
        let score = similarity(name, &item.name);
        if score < MATCH_THRESHOLD {
            continue;
        }
        match best {
            Some((_, best_score)) if best_score >= score => {}
            _ => best = Some((item, score)),
        }
    }
    best
}

/// An ingredient the pantry fully covers.
#[derive(Debug, Clone, Serialize)]
pub struct IngredientMatch {
    pub ingredient: Ingredient,
    pub pantry_item_id: Uuid,
    pub pantry_item_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum PartialReason {
    /// Found, but not enough of it. `shortfall` is in the ingredient's unit.
    Insufficient { shortfall: f64 },
    /// Only a similarly named item was found.
    SimilarName { score: f64 },
}

#[derive(Debug, Clone, Serialize)]
pub struct PartialMatch {
    pub ingredient: Ingredient,
    pub pantry_item_id: Uuid,
    pub pantry_item_name: String,
    #[serde(flatten)]
    pub reason: PartialReason,
}

/// How well a pantry covers one recipe.
#[derive(Debug, Clone, Serialize)]
pub struct RecipeMatch {
    /// 0 to 100; partial matches count half.
    pub percentage: u8,
    pub available: Vec<IngredientMatch>,
    pub partial: Vec<PartialMatch>,
    pub missing: Vec<Ingredient>,
}

impl RecipeMatch {
    pub fn is_complete(&self) -> bool {
        self.partial.is_empty() && self.missing.is_empty() && !self.available.is_empty()
    }
}

pub fn match_recipe(ingredients: &[Ingredient], pantry: &[PantryItem]) -> RecipeMatch {
    let mut available = Vec::new();
    let mut partial = Vec::new();
    let mut missing = Vec::new();

    for ingredient in ingredients {
        let Some((item, score)) = find_best_match(&ingredient.name, pantry) else {
            missing.push(ingredient.clone());
            continue;
        };

        if score < STRONG_MATCH {
            partial.push(PartialMatch {
                ingredient: ingredient.clone(),
                pantry_item_id: item.id,
                pantry_item_name: item.name.clone(),
                reason: PartialReason::SimilarName { score },
            });
            continue;
        }

        // A zero quantity ("salt to taste") only needs the item to exist.
        let comparison = if ingredient.quantity > 0.0 {
            compare(
                &Quantity::new(item.quantity, &item.unit),
                &Quantity::new(ingredient.quantity, &ingredient.unit),
            )
        } else {
            Comparison::Sufficient
        };

        match comparison {
            Comparison::Insufficient { shortfall } => partial.push(PartialMatch {
                ingredient: ingredient.clone(),
                pantry_item_id: item.id,
                pantry_item_name: item.name.clone(),
                reason: PartialReason::Insufficient { shortfall },
            }),
            Comparison::Sufficient | Comparison::NotComparable => {
                available.push(IngredientMatch {
                    ingredient: ingredient.clone(),
                    pantry_item_id: item.id,
                    pantry_item_name: item.name.clone(),
                })
            }
        }
    }

    let total = ingredients.len();
    let percentage = if total == 0 {
        0
    } else {
        let covered = available.len() as f64 + 0.5 * partial.len() as f64;
        (covered / total as f64 * 100.0).round() as u8
    };

    RecipeMatch {
        percentage,
        available,
        partial,
        missing,
    }
}

/// A recipe paired with its pantry match.
#[derive(Debug, Clone, Serialize)]
pub struct RankedRecipe<'a> {
    pub recipe: &'a Recipe,
    #[serde(rename = "match")]
    pub matched: RecipeMatch,
}

/// Orders recipes by how much of each the pantry covers, best first.
pub fn rank_recipes<'a>(recipes: &'a [Recipe], pantry: &[PantryItem]) -> Vec<RankedRecipe<'a>> {
    let mut ranked: Vec<RankedRecipe<'a>> = recipes
        .iter()
        .map(|recipe| RankedRecipe {
            recipe,
            matched: match_recipe(&recipe.ingredients, pantry),
        })
        .collect();
    ranked.sort_by(|a, b| b.matched.percentage.cmp(&a.matched.percentage));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pantry(items: &[(&str, f64, &str)]) -> Vec<PantryItem> {
        let user = Uuid::new_v4();
        items
            .iter()
            .map(|(name, qty, unit)| PantryItem::new(user, *name, *qty, *unit))
            .collect()
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Fresh Tomatoes, diced"), "tomato");
        assert_eq!(normalize_name("Blueberries"), "blueberry");
        assert_eq!(normalize_name("Large EGGS"), "egg");
        assert_eq!(normalize_name("peaches"), "peach");
        assert_eq!(normalize_name("Asparagus"), "asparagus");
        assert_eq!(normalize_name("   "), "");
    }

    #[test]
    fn test_similarity() {
        assert_eq!(similarity("Tomatoes", "tomato"), 1.0);
        assert_eq!(similarity("chicken breast", "Chicken"), STRONG_MATCH);
        assert_eq!(similarity("red bell pepper", "green bell pepper"), 0.5);
        assert_eq!(similarity("flour", "sugar"), 0.0);
        assert_eq!(similarity("", "sugar"), 0.0);
    }

    #[test]
    fn test_find_best_match_prefers_exact() {
        let items = pantry(&[("chicken stock", 1.0, "l"), ("chicken", 500.0, "g")]);
        let (item, score) = find_best_match("Chicken", &items).unwrap();
        assert_eq!(item.name, "chicken");
        assert_eq!(score, 1.0);
        assert!(find_best_match("saffron", &items).is_none());
    }

    #[test]
    fn test_all_ingredients_present_scores_100() {
        let items = pantry(&[("flour", 1.0, "kg"), ("eggs", 6.0, ""), ("milk", 1.0, "l")]);
        let ingredients = vec![
            Ingredient::new("flour", 2.0, "cups"),
            Ingredient::new("egg", 2.0, ""),
            Ingredient::new("milk", 250.0, "ml"),
        ];

        let result = match_recipe(&ingredients, &items);
        assert_eq!(result.percentage, 100);
        // flour: cups vs kg is not comparable but the item is present
        assert_eq!(result.available.len(), 3);
        assert!(result.missing.is_empty());
        assert!(result.is_complete());
    }

    #[test]
    fn test_no_overlap_scores_zero_and_lists_all_missing() {
        let items = pantry(&[("rice", 1.0, "kg")]);
        let ingredients = vec![
            Ingredient::new("salmon", 200.0, "g"),
            Ingredient::new("lemon", 1.0, ""),
        ];

        let result = match_recipe(&ingredients, &items);
        assert_eq!(result.percentage, 0);
        assert_eq!(result.missing.len(), 2);
        assert!(result.available.is_empty());
        assert!(result.partial.is_empty());
    }

    #[test]
    fn test_insufficient_quantity_is_partial() {
        let items = pantry(&[("butter", 50.0, "g"), ("sugar", 1.0, "kg")]);
        let ingredients = vec![
            Ingredient::new("butter", 200.0, "g"),
            Ingredient::new("sugar", 100.0, "g"),
        ];

        let result = match_recipe(&ingredients, &items);
        assert_eq!(result.partial.len(), 1);
        assert_eq!(
            result.partial[0].reason,
            PartialReason::Insufficient { shortfall: 150.0 }
        );
        assert_eq!(result.percentage, 75);
    }

    #[test]
    fn test_similar_name_is_partial() {
        let items = pantry(&[("green bell pepper", 2.0, "")]);
        let ingredients = vec![Ingredient::new("red bell pepper", 1.0, "")];

        let result = match_recipe(&ingredients, &items);
        assert_eq!(result.partial.len(), 1);
        assert!(matches!(
            result.partial[0].reason,
            PartialReason::SimilarName { .. }
        ));
        assert_eq!(result.percentage, 50);
    }

    #[test]
    fn test_empty_recipe_scores_zero() {
        let items = pantry(&[("rice", 1.0, "kg")]);
        let result = match_recipe(&[], &items);
        assert_eq!(result.percentage, 0);
        assert!(!result.is_complete());
    }

    #[test]
    fn test_rank_recipes_orders_by_percentage() {
        let user = Uuid::new_v4();
        let items = pantry(&[("pasta", 500.0, "g"), ("tomato sauce", 1.0, "cup")]);
        let recipes = vec![
            Recipe::new("Sushi", user).with_ingredients(vec![Ingredient::new("rice", 1.0, "cup")]),
            Recipe::new("Pasta", user).with_ingredients(vec![
                Ingredient::new("pasta", 200.0, "g"),
                Ingredient::new("tomato sauce", 0.5, "cup"),
            ]),
        ];

        let ranked = rank_recipes(&recipes, &items);
        assert_eq!(ranked[0].recipe.title, "Pasta");
        assert_eq!(ranked[0].matched.percentage, 100);
        assert_eq!(ranked[1].matched.percentage, 0);
    }
}
