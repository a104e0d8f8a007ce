use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Completion API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible API (e.g. "https://api.openai.com/v1")
    pub base_url: String,
    pub model: String,
    /// Secret key; never written back out
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            timeout_secs: 60,
        }
    }
}

impl LlmConfig {
    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

/// Public meal database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MealDbConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for MealDbConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.themealdb.com/api/json/v1/1".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Path to the SQLite database
    pub database_path: ConfigValue<PathBuf>,
    /// Directory for uploaded images
    pub data_dir: ConfigValue<PathBuf>,
    /// Email of the user the CLI acts as
    pub user: ConfigValue<String>,
    /// Port the server listens on
    pub port: ConfigValue<u16>,
    /// Largest accepted image upload, in bytes
    pub max_upload_bytes: usize,
    pub llm: LlmConfig,
    pub mealdb: MealDbConfig,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    database_path: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    user: Option<String>,
    port: Option<u16>,
    max_upload_bytes: Option<usize>,
    llm: Option<LlmConfig>,
    mealdb: Option<MealDbConfig>,
}

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut database_path = ConfigValue::new(
            Self::default_data_dir().join("pantrychef.db"),
            ConfigSource::Default,
        );
        let mut data_dir = ConfigValue::new(Self::default_data_dir(), ConfigSource::Default);
        let mut user = ConfigValue::new("default@localhost".to_string(), ConfigSource::Default);
        let mut port = ConfigValue::new(DEFAULT_PORT, ConfigSource::Default);
        let mut max_upload_bytes = DEFAULT_MAX_UPLOAD_BYTES;
        let mut llm = LlmConfig::default();
        let mut mealdb = MealDbConfig::default();
        let mut config_file = None;

        // Try to load from config file
        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            // Relative paths are resolved against the config file's directory
            let resolve = |p: PathBuf| {
                if p.is_relative() {
                    path.parent().map(|dir| dir.join(&p)).unwrap_or(p)
                } else {
                    p
                }
            };

            if let Some(p) = file_config.database_path {
                database_path = ConfigValue::new(resolve(p), ConfigSource::File);
            }
            if let Some(p) = file_config.data_dir {
                data_dir = ConfigValue::new(resolve(p), ConfigSource::File);
            }
            if let Some(u) = file_config.user {
                user = ConfigValue::new(u, ConfigSource::File);
            }
            if let Some(p) = file_config.port {
                port = ConfigValue::new(p, ConfigSource::File);
            }
            if let Some(max) = file_config.max_upload_bytes {
                max_upload_bytes = max;
            }
            if let Some(l) = file_config.llm {
                llm = l;
            }
            if let Some(m) = file_config.mealdb {
                mealdb = m;
            }
            config_file = Some(path);
        }

        // Apply environment variable overrides
        if let Ok(p) = std::env::var("PANTRY_DATABASE_PATH") {
            database_path = ConfigValue::new(PathBuf::from(p), ConfigSource::Environment);
        }
        if let Ok(p) = std::env::var("PANTRY_DATA_DIR") {
            data_dir = ConfigValue::new(PathBuf::from(p), ConfigSource::Environment);
        }
        if let Ok(u) = std::env::var("PANTRY_USER") {
            user = ConfigValue::new(u, ConfigSource::Environment);
        }
        if let Ok(p) = std::env::var("PANTRY_PORT") {
            let parsed = p
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PANTRY_PORT".to_string(), p.clone()))?;
            port = ConfigValue::new(parsed, ConfigSource::Environment);
        }
        if let Ok(url) = std::env::var("PANTRY_LLM_BASE_URL") {
            llm.base_url = url;
        }
        if let Ok(model) = std::env::var("PANTRY_LLM_MODEL") {
            llm.model = model;
        }
        if let Ok(key) = std::env::var("PANTRY_LLM_API_KEY") {
            llm.api_key = Some(key);
        }
        if let Ok(url) = std::env::var("PANTRY_MEALDB_URL") {
            mealdb.base_url = url;
        }

        Ok(Self {
            database_path,
            data_dir,
            user,
            port,
            max_upload_bytes,
            llm,
            mealdb,
            config_file,
        })
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/pantrychef/
    /// - macOS: ~/Library/Application Support/pantrychef/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pantrychef")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/pantrychef/
    /// - macOS: ~/Library/Application Support/pantrychef/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pantrychef")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    InvalidValue(String, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::InvalidValue(key, value) => {
                write!(f, "Invalid value '{}' for {}", value, key)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
