use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

use commands::{BrowseCommand, CommandResult, ConfigCommand, PantryCommand, RecipeCommand};
use pantrychef::config::Config;
use pantrychef::db::{init_db, PantryRepository, RecipeRepository, UserRepository};
use pantrychef::mealdb::MealDbClient;
use pantrychef::models::User;
use pantrychef::units::convert_str;

#[derive(Parser)]
#[command(name = "pantrychef")]
#[command(version)]
#[command(about = "Track your pantry and cook from what you have", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage pantry items
    Pantry(PantryCommand),

    /// Manage personal recipes
    Recipe(RecipeCommand),

    /// Browse the public meal database
    Browse(BrowseCommand),

    /// Convert between cooking units
    Convert {
        /// Amount to convert
        amount: f64,
        /// Unit to convert from (e.g. cup)
        from: String,
        /// Unit to convert to (e.g. ml)
        to: String,
    },

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    // Quiet unless asked
    if std::env::var_os("RUST_LOG").is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    }

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// The configured user, created on first use.
async fn current_user(pool: &sqlx::SqlitePool, config: &Config) -> Result<User, sqlx::Error> {
    UserRepository::new(pool.clone())
        .ensure(&config.user.value)
        .await
}

async fn run() -> CommandResult {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config)?;

    match cli.command {
        Some(Commands::Pantry(cmd)) => {
            let pool = init_db(&config.database_path.value).await?;
            let user = current_user(&pool, &config).await?;
            cmd.run(&PantryRepository::new(pool), &user).await?;
        }
        Some(Commands::Recipe(cmd)) => {
            let pool = init_db(&config.database_path.value).await?;
            let user = current_user(&pool, &config).await?;
            let recipes = RecipeRepository::new(pool.clone());
            let pantry = PantryRepository::new(pool);
            cmd.run(&recipes, &pantry, &user).await?;
        }
        Some(Commands::Browse(cmd)) => {
            let pool = init_db(&config.database_path.value).await?;
            let user = current_user(&pool, &config).await?;
            let client = MealDbClient::from_config(&config.mealdb)?;
            cmd.run(&client, &RecipeRepository::new(pool), &user).await?;
        }
        Some(Commands::Convert { amount, from, to }) => {
            let result = convert_str(amount, &from, &to)?;
            println!("{} {} = {:.2} {}", amount, from, result, to);
        }
        Some(Commands::Config(cmd)) => {
            cmd.run(&config)?;
        }
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}
