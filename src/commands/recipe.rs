use clap::{Args, Subcommand};
use std::io::{self, Write};
use uuid::Uuid;

use super::{truncate, CommandResult, OutputFormat};
use pantrychef::db::{PantryRepository, RecipeRepository};
use pantrychef::matching::{match_recipe, PartialReason};
use pantrychef::models::{Ingredient, Recipe, RecipeSource, TimeCategory, User};

#[derive(Args)]
pub struct RecipeCommand {
    #[command(subcommand)]
    pub command: RecipeSubcommand,
}

#[derive(Subcommand)]
pub enum RecipeSubcommand {
    /// Create a new recipe
    Create {
        /// Title of the recipe
        title: String,

        /// Short description
        #[arg(long)]
        description: Option<String>,

        /// Instruction step (can be repeated, in order)
        #[arg(long = "step", value_name = "STEP")]
        steps: Vec<String>,

        /// Prep time in minutes
        #[arg(long)]
        prep_time: Option<i32>,

        /// Cook time in minutes
        #[arg(long)]
        cook_time: Option<i32>,

        /// Number of servings
        #[arg(long)]
        servings: Option<i32>,

        /// Tags (can be repeated)
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,

        /// Image URL
        #[arg(long)]
        image_url: Option<String>,
    },

    /// List your recipes
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Filter by tag
        #[arg(long = "tag", value_name = "TAG")]
        tag: Option<String>,

        /// Filter by total time (quick, moderate, lengthy)
        #[arg(long)]
        time: Option<TimeCategory>,
    },

    /// Show a recipe's details
    Show {
        /// Recipe ID (UUID) or title
        identifier: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Delete a recipe and any shared copies of it
    Delete {
        /// Recipe ID (UUID) or title
        identifier: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },

    /// Add an ingredient to a recipe
    AddIngredient {
        /// Recipe ID (UUID) or title
        identifier: String,

        /// Ingredient name
        #[arg(long)]
        name: String,

        /// Quantity (amount)
        #[arg(long)]
        quantity: f64,

        /// Unit of measurement
        #[arg(long, default_value = "")]
        unit: String,
    },

    /// Compare a recipe against your pantry
    Match {
        /// Recipe ID (UUID) or title
        identifier: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Cook a recipe, taking its ingredients out of the pantry
    Cook {
        /// Recipe ID (UUID) or title
        identifier: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

async fn find_recipe(
    repo: &RecipeRepository,
    user: &User,
    identifier: &str,
) -> Result<Recipe, Box<dyn std::error::Error>> {
    // Try to parse as UUID first, then fall back to title lookup
    let recipe = if let Ok(uuid) = Uuid::parse_str(identifier) {
        repo.get_owned(user.id, uuid).await?
    } else {
        repo.get_by_title(user.id, identifier).await?
    };
    recipe.ok_or_else(|| format!("Recipe not found: {}", identifier).into())
}

impl RecipeCommand {
    pub async fn run(
        &self,
        repo: &RecipeRepository,
        pantry: &PantryRepository,
        user: &User,
    ) -> CommandResult {
        match &self.command {
            RecipeSubcommand::Create {
                title,
                description,
                steps,
                prep_time,
                cook_time,
                servings,
                tags,
                image_url,
            } => {
                if title.trim().is_empty() {
                    return Err("Recipe title cannot be empty".into());
                }

                let mut recipe = Recipe::new(title.trim(), user.id)
                    .with_instructions(steps.clone())
                    .with_tags(tags.clone())
                    .with_source(RecipeSource::Manual);
                if let Some(description) = description {
                    recipe = recipe.with_description(description);
                }
                if let Some(prep_time) = prep_time {
                    recipe = recipe.with_prep_time(*prep_time);
                }
                if let Some(cook_time) = cook_time {
                    recipe = recipe.with_cook_time(*cook_time);
                }
                if let Some(servings) = servings {
                    recipe = recipe.with_servings(*servings);
                }
                recipe.image_url = image_url.clone();

                let created = repo.create(&recipe).await?;
                println!("Created recipe:");
                println!("{}", created);
                println!("ID: {}", created.id);
                Ok(())
            }

            RecipeSubcommand::List { format, tag, time } => {
                let mut recipes = repo.list(user.id).await?;

                if let Some(tag) = tag {
                    let tag_lower = tag.to_lowercase();
                    recipes.retain(|r| r.tags.iter().any(|t| t.to_lowercase() == tag_lower));
                }
                if let Some(time) = time {
                    recipes.retain(|r| r.time_category() == Some(*time));
                }

                if recipes.is_empty() {
                    println!("No recipes found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&recipes)?);
                    }
                    OutputFormat::Text => {
                        println!("{:<36}  {:<30}  {:<9}  {:<9}  TAGS", "ID", "TITLE", "TIME", "SOURCE");
                        println!("{}", "-".repeat(100));
                        for recipe in &recipes {
                            let time = recipe
                                .time_category()
                                .map(|t| t.to_string())
                                .unwrap_or_else(|| "-".to_string());
                            println!(
                                "{:<36}  {:<30}  {:<9}  {:<9}  {}",
                                recipe.id,
                                truncate(&recipe.title, 30),
                                time,
                                recipe.source,
                                recipe.tags.join(", ")
                            );
                        }
                        println!("\nTotal: {} recipe(s)", recipes.len());
                    }
                }
                Ok(())
            }

            RecipeSubcommand::Show { identifier, format } => {
                let recipe = find_recipe(repo, user, identifier).await?;
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&recipe)?);
                    }
                    OutputFormat::Text => {
                        println!("{}", recipe);
                    }
                }
                Ok(())
            }

            RecipeSubcommand::Delete { identifier, force } => {
                let recipe = find_recipe(repo, user, identifier).await?;

                // Confirm deletion unless --force is used
                if !force {
                    print!("Delete recipe '{}'? [y/N] ", recipe.title);
                    io::stdout().flush()?;

                    let mut input = String::new();
                    io::stdin().read_line(&mut input)?;

                    if !input.trim().eq_ignore_ascii_case("y") {
                        println!("Deletion cancelled.");
                        return Ok(());
                    }
                }

                let shared_removed = repo.delete(user.id, recipe.id).await?.unwrap_or(0);
                println!("Deleted recipe: {}", recipe.title);
                if shared_removed > 0 {
                    println!("  Also removed {} shared copy(ies)", shared_removed);
                }
                Ok(())
            }

            RecipeSubcommand::AddIngredient {
                identifier,
                name,
                quantity,
                unit,
            } => {
                if name.trim().is_empty() {
                    return Err("Ingredient name cannot be empty".into());
                }
                if !quantity.is_finite() || *quantity < 0.0 {
                    return Err("Quantity must be zero or a positive number".into());
                }

                let recipe = find_recipe(repo, user, identifier).await?;
                let ingredient = Ingredient::new(name.trim(), *quantity, unit.trim());
                repo.add_ingredient(recipe.id, &ingredient).await?;

                println!("Added ingredient to '{}':", recipe.title);
                println!("  {}", ingredient);
                Ok(())
            }

            RecipeSubcommand::Match { identifier, format } => {
                let recipe = find_recipe(repo, user, identifier).await?;
                let items = pantry.list(user.id).await?;
                let matched = match_recipe(&recipe.ingredients, &items);

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&matched)?);
                    }
                    OutputFormat::Text => {
                        println!("{}: {}% of ingredients on hand", recipe.title, matched.percentage);
                        for hit in &matched.available {
                            println!("  [x] {} (pantry: {})", hit.ingredient, hit.pantry_item_name);
                        }
                        for partial in &matched.partial {
                            let why = match &partial.reason {
                                PartialReason::Insufficient { shortfall } => {
                                    format!("short by {:.2}", shortfall)
                                }
                                PartialReason::SimilarName { .. } => {
                                    format!("maybe '{}'", partial.pantry_item_name)
                                }
                            };
                            println!("  [~] {} ({})", partial.ingredient, why);
                        }
                        for missing in &matched.missing {
                            println!("  [ ] {}", missing);
                        }
                    }
                }
                Ok(())
            }

            RecipeSubcommand::Cook { identifier, format } => {
                let recipe = find_recipe(repo, user, identifier).await?;
                let report = pantry.deduct_for_recipe(user.id, &recipe.ingredients).await?;

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&report)?);
                    }
                    OutputFormat::Text => {
                        println!("Cooked '{}'", recipe.title);
                        for used in &report.deducted {
                            println!(
                                "  - {:.2} {} {} ({:.2} left)",
                                used.amount, used.unit, used.pantry_item_name, used.remaining
                            );
                        }
                        for skipped in &report.skipped {
                            println!("  skipped {}: {}", skipped.ingredient, skipped.reason);
                        }
                    }
                }
                Ok(())
            }
        }
    }
}
