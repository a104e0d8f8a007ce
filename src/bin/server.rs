//! PantryChef API server
//!
//! Serves the pantry, recipe, community and AI endpoints over HTTP.
//!
//! # Configuration
//!
//! Reads the same `config.yaml` as the CLI (see `pantrychef config show`),
//! with environment overrides:
//! - `PANTRY_PORT`: Port to listen on (default: 8080)
//! - `PANTRY_DATABASE_PATH`: SQLite database file
//! - `PANTRY_DATA_DIR`: Directory for uploaded images
//! - `PANTRY_LLM_API_KEY`: Completion API key; AI endpoints answer 503 without it
//!
//! # Config File Format
//!
//! ```yaml
//! port: 8080
//! max_upload_bytes: 5242880
//! llm:
//!   base_url: "https://api.openai.com/v1"
//!   model: "gpt-4o-mini"
//!   api_key: "sk-..."
//! ```
//!
//! API keys are issued with `pantrychef-admin key issue <email>`.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pantrychef::config::Config;
use pantrychef::db::init_db;
use pantrychef::llm::{CompletionProvider, OpenAiClient};
use pantrychef::mealdb::MealDbClient;
use pantrychef::server::{router, AppState};
use pantrychef::storage::ImageStore;

#[derive(Parser)]
#[command(name = "pantrychef-server")]
#[command(version)]
#[command(about = "PantryChef HTTP API server")]
struct Cli {
    /// Path to config file
    #[arg(long, short)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pantrychef=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run(Cli::parse()).await {
        tracing::error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load(cli.config)?;

    match &config.config_file {
        Some(path) => tracing::info!("Config file: {}", path.display()),
        None => tracing::info!("No config file, using defaults"),
    }
    tracing::info!("Database: {}", config.database_path.value.display());
    tracing::info!("Data directory: {}", config.data_dir.value.display());

    std::fs::create_dir_all(&config.data_dir.value)?;
    let pool = init_db(&config.database_path.value).await?;

    let llm: Option<Arc<dyn CompletionProvider>> = if config.llm.is_configured() {
        tracing::info!(model = %config.llm.model, "Completion API: {}", config.llm.base_url);
        Some(Arc::new(OpenAiClient::from_config(&config.llm)?))
    } else {
        tracing::warn!("No completion API key configured - AI endpoints are disabled");
        None
    };

    let state = AppState {
        pool,
        llm,
        images: ImageStore::new(&config.data_dir.value, config.max_upload_bytes),
        mealdb: MealDbClient::from_config(&config.mealdb)?,
    };
    let app = router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port.value));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
