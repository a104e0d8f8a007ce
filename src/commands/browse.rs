use clap::{Args, Subcommand};

use super::{truncate, CommandResult, OutputFormat};
use pantrychef::db::RecipeRepository;
use pantrychef::mealdb::MealDbClient;
use pantrychef::models::User;

#[derive(Args)]
pub struct BrowseCommand {
    #[command(subcommand)]
    pub command: BrowseSubcommand,
}

#[derive(Subcommand)]
pub enum BrowseSubcommand {
    /// Search the public meal database
    Search {
        /// Meal name, or an ingredient with --ingredient
        query: String,

        /// Treat the query as a main ingredient
        #[arg(long, short)]
        ingredient: bool,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Import a meal into your recipes
    Import {
        /// Meal ID from search results
        meal_id: String,
    },
}

impl BrowseCommand {
    pub async fn run(
        &self,
        client: &MealDbClient,
        recipes: &RecipeRepository,
        user: &User,
    ) -> CommandResult {
        match &self.command {
            BrowseSubcommand::Search {
                query,
                ingredient,
                format,
            } => {
                let rows: Vec<(String, String, String)> = if *ingredient {
                    client
                        .filter_by_ingredient(query)
                        .await?
                        .into_iter()
                        .map(|m| (m.id, m.name, String::new()))
                        .collect()
                } else {
                    let meals = client.search(query).await?;
                    if let OutputFormat::Json = format {
                        println!("{}", serde_json::to_string_pretty(&meals)?);
                        return Ok(());
                    }
                    meals
                        .into_iter()
                        .map(|m| {
                            let detail = [m.area, m.category]
                                .into_iter()
                                .flatten()
                                .collect::<Vec<_>>()
                                .join(" / ");
                            (m.id, m.name, detail)
                        })
                        .collect()
                };

                if rows.is_empty() {
                    println!("No meals found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        let json: Vec<_> = rows
                            .iter()
                            .map(|(id, name, _)| serde_json::json!({"id": id, "name": name}))
                            .collect();
                        println!("{}", serde_json::to_string_pretty(&json)?);
                    }
                    OutputFormat::Text => {
                        println!("{:<8}  {:<40}  DETAILS", "ID", "NAME");
                        println!("{}", "-".repeat(72));
                        for (id, name, detail) in &rows {
                            println!("{:<8}  {:<40}  {}", id, truncate(name, 40), detail);
                        }
                        println!("\nTotal: {} meal(s)", rows.len());
                    }
                }
                Ok(())
            }

            BrowseSubcommand::Import { meal_id } => {
                let meal = client
                    .lookup(meal_id)
                    .await?
                    .ok_or_else(|| format!("Meal not found: {}", meal_id))?;
                let created = recipes.create(&meal.into_recipe(user.id)).await?;
                println!("Imported recipe:");
                println!("{}", created);
                println!("ID: {}", created.id);
                Ok(())
            }
        }
    }
}
