use clap::{Args, Subcommand};
use uuid::Uuid;

use super::{truncate, CommandResult, OutputFormat};
use pantrychef::db::PantryRepository;
use pantrychef::models::User;

#[derive(Args)]
pub struct PantryCommand {
    #[command(subcommand)]
    pub command: PantrySubcommand,
}

#[derive(Subcommand)]
pub enum PantrySubcommand {
    /// Add stock; merges into an existing item when units allow
    Add {
        /// Item name
        name: String,

        /// Quantity (amount)
        quantity: f64,

        /// Unit of measurement (omit for counted items)
        #[arg(default_value = "")]
        unit: String,
    },

    /// List pantry items
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Update an item
    Update {
        /// Item ID
        id: Uuid,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New quantity
        #[arg(long)]
        quantity: Option<f64>,

        /// New unit
        #[arg(long)]
        unit: Option<String>,
    },

    /// Remove an item
    Remove {
        /// Item ID
        id: Uuid,
    },
}

impl PantryCommand {
    pub async fn run(&self, repo: &PantryRepository, user: &User) -> CommandResult {
        match &self.command {
            PantrySubcommand::Add {
                name,
                quantity,
                unit,
            } => {
                let item = repo.add(user.id, name, *quantity, unit).await?;
                println!("Pantry now has: {}", item);
                Ok(())
            }

            PantrySubcommand::List { format } => {
                let items = repo.list(user.id).await?;

                if items.is_empty() {
                    println!("Pantry is empty");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&items)?);
                    }
                    OutputFormat::Text => {
                        println!("{:<36}  {:<30}  {:>10}  UNIT", "ID", "NAME", "QUANTITY");
                        println!("{}", "-".repeat(88));
                        for item in &items {
                            println!(
                                "{:<36}  {:<30}  {:>10}  {}",
                                item.id,
                                truncate(&item.name, 30),
                                format!("{:.2}", item.quantity),
                                item.unit
                            );
                        }
                        println!("\nTotal: {} item(s)", items.len());
                    }
                }
                Ok(())
            }

            PantrySubcommand::Update {
                id,
                name,
                quantity,
                unit,
            } => {
                if name.is_none() && quantity.is_none() && unit.is_none() {
                    return Err("Nothing to update. Provide at least one option.".into());
                }

                let item = repo
                    .get(user.id, *id)
                    .await?
                    .ok_or_else(|| format!("Pantry item not found: {}", id))?;

                let updated = repo
                    .update(
                        user.id,
                        item.id,
                        name.as_deref().unwrap_or(&item.name),
                        quantity.unwrap_or(item.quantity),
                        unit.as_deref().unwrap_or(&item.unit),
                    )
                    .await?
                    .ok_or_else(|| format!("Pantry item not found: {}", id))?;
                println!("Updated: {}", updated);
                Ok(())
            }

            PantrySubcommand::Remove { id } => {
                if repo.delete(user.id, *id).await? {
                    println!("Removed pantry item {}", id);
                    Ok(())
                } else {
                    Err(format!("Pantry item not found: {}", id).into())
                }
            }
        }
    }
}
