use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::llm::{RetryPolicy, DEFAULT_BASE_URL, DEFAULT_MAX_COMPLETION_TOKENS, DEFAULT_MODEL};
use crate::transcription::{DEFAULT_LANGUAGE, DEFAULT_TRANSCRIPTION_MODEL};

const DEFAULT_CONFIG: &str = r#"
[llm]
# api_key = "sk-..."   (falls back to OPENAI_API_KEY)
base_url = "https://api.openai.com/v1"
model = "gpt-4o-mini"
timeout_secs = 60
max_attempts = 3
base_delay_ms = 800
max_delay_ms = 10000
max_completion_tokens = 1024

[transcription]
model = "whisper-1"
language = "id"
timeout_secs = 120

[ocr]
tesseract = "tesseract"
languages = "ind+eng"
target_height = 1600
timeout_secs = 30

[database]
# path = "/var/lib/finot/finot.db"
"#;

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct WorkerConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub transcription: TranscriptionConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub max_completion_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: 60,
            max_attempts: 3,
            base_delay_ms: 800,
            max_delay_ms: 10_000,
            max_completion_tokens: DEFAULT_MAX_COMPLETION_TOKENS,
        }
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.base_delay_ms))
            .with_max_delay(Duration::from_millis(self.max_delay_ms))
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct TranscriptionConfig {
    pub model: String,
    pub language: String,
    pub timeout_secs: u64,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_TRANSCRIPTION_MODEL.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct OcrConfig {
    pub tesseract: PathBuf,
    pub languages: String,
    pub target_height: u32,
    pub timeout_secs: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract: PathBuf::from("tesseract"),
            languages: extractors::ocr::DEFAULT_LANGUAGES.to_string(),
            target_height: extractors::ocr::DEFAULT_TARGET_HEIGHT,
            timeout_secs: extractors::ocr::DEFAULT_OCR_TIMEOUT.as_secs(),
        }
    }
}

impl OcrConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
}

impl DatabaseConfig {
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(default_database_path)
    }
}

impl WorkerConfig {
    /// Loads an explicit file, or the per-user default (created on first run).
    /// `FINOT__SECTION__KEY` variables override file values.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, PathBuf), ConfigError> {
        let config_path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let path = get_config_path();
                write_default_if_missing(&path)?;
                path
            }
        };

        let builder = Config::builder()
            .add_source(File::from(config_path.clone()))
            .add_source(Environment::with_prefix("FINOT").separator("__"))
            .build()?;

        let mut config: WorkerConfig = builder.try_deserialize()?;
        if config.llm.api_key.as_deref().map_or(true, str::is_empty) {
            config.llm.api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty());
        }

        Ok((config, config_path))
    }

    pub fn api_key(&self) -> Result<&str, ConfigError> {
        self.llm
            .api_key
            .as_deref()
            .ok_or_else(|| ConfigError::NotFound("llm.api_key (or OPENAI_API_KEY)".to_string()))
    }
}

fn write_default_if_missing(config_path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            ConfigError::Message(format!("Failed to create config directory: {e}"))
        })?;
    }

    if !config_path.exists() {
        std::fs::write(config_path, DEFAULT_CONFIG).map_err(|e| {
            ConfigError::Message(format!("Failed to write default config: {e}"))
        })?;
    }
    Ok(())
}

pub fn get_config_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("finot").join("worker.toml")
    } else {
        PathBuf::from("worker.toml")
    }
}

pub fn default_database_path() -> PathBuf {
    if let Some(data_dir) = dirs::data_dir() {
        data_dir.join("finot").join("finot.db")
    } else {
        PathBuf::from("finot.db")
    }
}
