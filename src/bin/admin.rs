//! PantryChef Admin CLI
//!
//! Administration tool for users, API keys and reports.
//!
//! # Usage
//!
//! ```bash
//! pantrychef-admin user add erik@example.com --name Erik
//! pantrychef-admin user list
//! pantrychef-admin key issue erik@example.com --label phone
//! pantrychef-admin key revoke <token>
//! pantrychef-admin report list --category bug
//! pantrychef-admin user remove erik@example.com
//! ```
//!
//! Uses the same config file and `PANTRY_*` overrides as the server.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use pantrychef::config::Config;
use pantrychef::db::{
    init_db, ApiKeyRepository, RecipeRepository, ReportRepository, SharedRecipeRepository,
    UserRepository,
};
use pantrychef::models::{ReportCategory, User};

type CliResult = Result<(), Box<dyn std::error::Error>>;

// ============================================================================
// CLI Structure
// ============================================================================

#[derive(Parser)]
#[command(name = "pantrychef-admin")]
#[command(version)]
#[command(about = "PantryChef server administration tool")]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage users
    User(UserCommand),
    /// Issue and revoke API keys
    Key(KeyCommand),
    /// Read user reports
    Report(ReportCommand),
}

#[derive(Args)]
struct UserCommand {
    #[command(subcommand)]
    command: UserSubcommand,
}

#[derive(Subcommand)]
enum UserSubcommand {
    /// Add a new user
    Add {
        /// User's email address
        email: String,
        /// User's display name
        #[arg(long, short)]
        name: Option<String>,
    },
    /// List all users
    List,
    /// Remove a user with their recipes, shared recipes and keys
    Remove {
        /// User's email address
        email: String,
    },
}

#[derive(Args)]
struct KeyCommand {
    #[command(subcommand)]
    command: KeySubcommand,
}

#[derive(Subcommand)]
enum KeySubcommand {
    /// Issue a new API key; the token is printed once
    Issue {
        /// User's email address
        email: String,
        /// Label to tell keys apart
        #[arg(long, short, default_value = "default")]
        label: String,
    },
    /// List a user's keys (hashes only)
    List {
        /// User's email address
        email: String,
    },
    /// Revoke a key by its token
    Revoke {
        /// The bearer token
        token: String,
    },
}

#[derive(Args)]
struct ReportCommand {
    #[command(subcommand)]
    command: ReportSubcommand,
}

#[derive(Subcommand)]
enum ReportSubcommand {
    /// List reports, newest first
    List {
        /// Only this category (bug, feedback, content, other)
        #[arg(long, short)]
        category: Option<ReportCategory>,
    },
}

// ============================================================================
// Commands
// ============================================================================

async fn find_user(users: &UserRepository, email: &str) -> Result<User, Box<dyn std::error::Error>> {
    users
        .get_by_email(email)
        .await?
        .ok_or_else(|| format!("User '{}' not found", email).into())
}

async fn add_user(users: &UserRepository, email: String, name: Option<String>) -> CliResult {
    let email = email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(format!("Invalid email address '{}'", email).into());
    }
    if users.get_by_email(&email).await?.is_some() {
        return Err(format!("User '{}' already exists", email).into());
    }

    let name = name.unwrap_or_else(|| {
        email
            .split('@')
            .next()
            .unwrap_or_default()
            .to_string()
    });
    let user = users.create(&User::new(&email, &name)).await?;

    println!("Added user: {}", user.email);
    println!("  ID: {}", user.id);
    println!("  Name: {}", user.display_name);
    Ok(())
}

async fn list_users(users: &UserRepository) -> CliResult {
    let all = users.list().await?;

    if all.is_empty() {
        println!("No users registered.");
        return Ok(());
    }

    println!("{:<40} {:<20} {:<36}", "EMAIL", "NAME", "ID");
    println!("{}", "-".repeat(98));
    for user in &all {
        println!("{:<40} {:<20} {:<36}", user.email, user.display_name, user.id);
    }

    println!();
    println!("Total: {} user(s)", all.len());
    Ok(())
}

async fn remove_user(pool: sqlx::SqlitePool, email: String) -> CliResult {
    let users = UserRepository::new(pool.clone());
    let user = find_user(&users, &email).await?;

    // Recipes go first so their shared copies are cleaned up too
    let recipes = RecipeRepository::new(pool.clone());
    let mut shared_removed = 0;
    let owned = recipes.list(user.id).await?;
    for recipe in &owned {
        shared_removed += recipes.delete(user.id, recipe.id).await?.unwrap_or(0);
    }
    let shared = SharedRecipeRepository::new(pool.clone());
    for leftover in shared.list_by_author(user.id).await? {
        shared.delete(user.id, leftover.id).await?;
        shared_removed += 1;
    }
    let keys = ApiKeyRepository::new(pool).revoke_all(user.id).await?;

    users.delete(user.id).await?;

    println!("Removed user: {}", user.email);
    println!("  Recipes: {}", owned.len());
    println!("  Shared recipes: {}", shared_removed);
    println!("  API keys: {}", keys);
    Ok(())
}

async fn issue_key(pool: sqlx::SqlitePool, email: String, label: String) -> CliResult {
    let user = find_user(&UserRepository::new(pool.clone()), &email).await?;
    let token = ApiKeyRepository::new(pool).issue(user.id, &label).await?;

    println!("Issued key '{}' for {}", label, user.email);
    println!();
    println!("  {}", token);
    println!();
    println!("Store it now; it cannot be shown again.");
    Ok(())
}

async fn list_keys(pool: sqlx::SqlitePool, email: String) -> CliResult {
    let user = find_user(&UserRepository::new(pool.clone()), &email).await?;
    let keys = ApiKeyRepository::new(pool).list_for_user(user.id).await?;

    if keys.is_empty() {
        println!("No keys issued for {}.", user.email);
        return Ok(());
    }

    println!("{:<20} {:<26} HASH", "LABEL", "CREATED");
    println!("{}", "-".repeat(80));
    for key in &keys {
        println!(
            "{:<20} {:<26} {}...",
            key.label,
            key.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
            &key.key_hash[..16]
        );
    }
    Ok(())
}

async fn revoke_key(pool: sqlx::SqlitePool, token: String) -> CliResult {
    if ApiKeyRepository::new(pool).revoke(token.trim()).await? {
        println!("Key revoked.");
        Ok(())
    } else {
        Err("No such key".into())
    }
}

async fn list_reports(pool: sqlx::SqlitePool, category: Option<ReportCategory>) -> CliResult {
    let reports = ReportRepository::new(pool).list(category).await?;

    if reports.is_empty() {
        println!("No reports.");
        return Ok(());
    }

    for report in &reports {
        println!(
            "[{}] {} {}",
            report.category,
            report.created_at.format("%Y-%m-%d %H:%M"),
            report.user_id
        );
        if let Some(shared_id) = report.shared_recipe_id {
            println!("  Shared recipe: {}", shared_id);
        }
        println!("  {}", report.message);
        println!();
    }
    println!("Total: {} report(s)", reports.len());
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> CliResult {
    let cli = Cli::parse();
    let config = Config::load(cli.config)?;
    let pool = init_db(&config.database_path.value).await?;

    match cli.command {
        Commands::User(user_cmd) => {
            let users = UserRepository::new(pool.clone());
            match user_cmd.command {
                UserSubcommand::Add { email, name } => add_user(&users, email, name).await,
                UserSubcommand::List => list_users(&users).await,
                UserSubcommand::Remove { email } => remove_user(pool, email).await,
            }
        }
        Commands::Key(key_cmd) => match key_cmd.command {
            KeySubcommand::Issue { email, label } => issue_key(pool, email, label).await,
            KeySubcommand::List { email } => list_keys(pool, email).await,
            KeySubcommand::Revoke { token } => revoke_key(pool, token).await,
        },
        Commands::Report(report_cmd) => match report_cmd.command {
            ReportSubcommand::List { category } => list_reports(pool, category).await,
        },
    }
}
