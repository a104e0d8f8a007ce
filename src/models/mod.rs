mod comment;
mod ingredient;
mod pantry_item;
mod rating;
mod recipe;
mod report;
mod shared_recipe;
mod time_category;
mod user;

pub use comment::Comment;
pub use ingredient::Ingredient;
pub use pantry_item::PantryItem;
pub use rating::{Rating, RatingSummary};
pub use recipe::{Recipe, RecipeSource};
pub use report::{Report, ReportCategory};
pub use shared_recipe::SharedRecipe;
pub use time_category::{parse_minutes, TimeCategory};
pub use user::{DietaryPreferences, User};
