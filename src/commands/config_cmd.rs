use clap::{Args, Subcommand};

use super::{CommandResult, OutputFormat};
use pantrychef::config::Config;

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl ConfigCommand {
    pub fn run(&self, config: &Config) -> CommandResult {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(config)?);
                    }
                    OutputFormat::Text => {
                        println!("Configuration");
                        println!("=============\n");

                        if let Some(path) = &config.config_file {
                            println!("Config file: {}", path.display());
                        } else {
                            println!(
                                "Config file: {} (not found)",
                                Config::default_config_path().display()
                            );
                        }
                        println!();

                        println!("database_path: {}", config.database_path.value.display());
                        println!("  source: {}", config.database_path.source);
                        println!("data_dir: {}", config.data_dir.value.display());
                        println!("  source: {}", config.data_dir.source);
                        println!("user: {}", config.user.value);
                        println!("  source: {}", config.user.source);
                        println!("port: {}", config.port.value);
                        println!("  source: {}", config.port.source);
                        println!("max_upload_bytes: {}", config.max_upload_bytes);
                        println!();

                        println!("llm.base_url: {}", config.llm.base_url);
                        println!("llm.model: {}", config.llm.model);
                        println!(
                            "llm.api_key: {}",
                            if config.llm.is_configured() { "(set)" } else { "(not set)" }
                        );
                        println!("mealdb.base_url: {}", config.mealdb.base_url);
                    }
                }
                Ok(())
            }
        }
    }
}
