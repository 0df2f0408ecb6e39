// src/environment.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

/// Tunables for one deployment environment, read from `config.yaml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub server: ServerSettings,
    pub browser: BrowserSettings,
    pub ai: AiSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub address: String,
    pub port: u16,
    /// JSON log file written alongside console output.
    pub log_file: Option<PathBuf>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_string(),
            port: 8000,
            log_file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub headless: bool,
    pub chrome_executable: Option<PathBuf>,
    /// Upper bound on simultaneously running browser instances.
    pub max_concurrent: usize,
    pub screenshot_dir: PathBuf,
    pub navigation_timeout_secs: u64,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_executable: None,
            max_concurrent: 2,
            screenshot_dir: std::env::temp_dir(),
            navigation_timeout_secs: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiSettings {
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://openrouter.ai/api/v1/chat/completions".to_string(),
            model: "openai/gpt-3.5-turbo".to_string(),
            temperature: 0.3,
            max_tokens: 900,
            timeout_secs: 30,
            max_attempts: 3,
            backoff_base_ms: 1000,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    local: EnvironmentConfig,
    production: EnvironmentConfig,
}

impl EnvironmentConfig {
    /// Load configuration for the current environment. Without a
    /// `config.yaml` the built-in defaults apply.
    pub fn load() -> Result<Self> {
        let environment = Self::get_environment();
        info!("Loading configuration for environment: {}", environment);

        let config_path = PathBuf::from("config.yaml");
        if !config_path.exists() {
            info!("config.yaml not found, using default settings");
            return Ok(Self::default());
        }

        let content =
            std::fs::read_to_string(&config_path).context("Failed to read config.yaml")?;
        let config = Self::from_yaml(&content, &environment)?;
        config.resolved()
    }

    pub fn get_environment() -> String {
        std::env::var("JOBTRACK_ENV")
            .or_else(|_| std::env::var("ENVIRONMENT"))
            .or_else(|_| std::env::var("ENV"))
            .unwrap_or_else(|_| "local".to_string())
    }

    pub fn from_yaml(content: &str, environment: &str) -> Result<Self> {
        let config_file: ConfigFile =
            serde_yaml::from_str(content).context("Failed to parse config.yaml")?;

        Ok(match environment {
            "production" => config_file.production,
            _ => config_file.local,
        })
    }

    // Make paths absolute
    fn resolved(mut self) -> Result<Self> {
        self.browser.screenshot_dir = Self::resolve_path(&self.browser.screenshot_dir)?;
        if let Some(log_file) = &self.server.log_file {
            self.server.log_file = Some(Self::resolve_path(log_file)?);
        }
        Ok(self)
    }

    fn resolve_path(path: &PathBuf) -> Result<PathBuf> {
        if path.is_absolute() {
            Ok(path.clone())
        } else {
            let current_dir = std::env::current_dir().context("Failed to get current directory")?;
            Ok(current_dir.join(path))
        }
    }

    /// Ensure the screenshot directory exists
    pub async fn ensure_directories(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.browser.screenshot_dir)
            .await
            .with_context(|| {
                format!(
                    "Failed to create directory: {}",
                    self.browser.screenshot_dir.display()
                )
            })
    }
}
