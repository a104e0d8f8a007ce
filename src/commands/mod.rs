mod browse;
mod config_cmd;
mod pantry;
mod recipe;

pub use browse::BrowseCommand;
pub use config_cmd::ConfigCommand;
pub use pantry::PantryCommand;
pub use recipe::RecipeCommand;

use clap::ValueEnum;

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Shortens `text` to `width` characters for table columns.
pub(crate) fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let cut: String = text.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}
