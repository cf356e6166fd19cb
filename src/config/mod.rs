use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::generation::{Provider, DEFAULT_LANGUAGE};
use crate::utils::SUPPORTED_LANGUAGES;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// YouTube Data API settings
    pub youtube: YoutubeConfig,

    /// Text generation settings
    pub generation: GenerationConfig,

    /// Application settings
    pub app: AppConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct YoutubeConfig {
    /// Base URL of the Data API
    pub api_base_url: String,

    /// API key; falls back to `YOUTUBE_API_KEY`
    pub api_key: Option<String>,

    /// Maximum number of playlist items to fetch
    pub max_items: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Model provider preset
    pub provider: Provider,

    /// Override of the provider's chat completions URL
    pub api_url: Option<String>,

    /// Override of the provider's default model
    pub model: Option<String>,

    /// API key; falls back to the provider's environment variable
    pub api_key: Option<String>,

    /// Language used when none is chosen
    pub default_language: String,

    /// Languages offered for transcripts
    pub supported_languages: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where per-user data is stored
    pub data_dir: Option<PathBuf>,

    /// Where exports are written
    pub output_dir: Option<PathBuf>,

    /// How long batch results stay visible after a run
    pub batch_settle_seconds: u64,
}

impl Default for YoutubeConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://www.googleapis.com/youtube/v3".to_string(),
            api_key: None,
            max_items: 50,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            api_url: None,
            model: None,
            api_key: None,
            default_language: DEFAULT_LANGUAGE.to_string(),
            supported_languages: SUPPORTED_LANGUAGES.iter().map(|l| l.to_string()).collect(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            output_dir: None,
            batch_settle_seconds: 5,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Load configuration from file or create default
    pub async fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?).await
    }

    pub async fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs_err::read_to_string(path).context("Failed to read config file")?;

            let config: Config =
                serde_yaml::from_str(&content).context("Failed to parse config file")?;

            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to(path).await?;
            tracing::info!("Created default configuration at {}", path.display());
            Ok(config)
        }
    }

    /// Save configuration to file
    pub async fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?).await
    }

    async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;

        fs_err::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir().context("Could not determine config directory")?;

        Ok(config_dir.join("playlist-scribe").join("config.yaml"))
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.youtube.max_items == 0 {
            anyhow::bail!("youtube.max_items must be at least 1");
        }

        if self.generation.default_language.trim().is_empty() {
            anyhow::bail!("generation.default_language must not be empty");
        }

        if !self.generation.supported_languages.is_empty()
            && !self
                .generation
                .supported_languages
                .contains(&self.generation.default_language)
        {
            anyhow::bail!(
                "generation.default_language \"{}\" is not in generation.supported_languages",
                self.generation.default_language
            );
        }

        Ok(())
    }

    /// YouTube API key from the file or the environment
    pub fn youtube_api_key(&self) -> Option<String> {
        non_empty(self.youtube.api_key.clone())
            .or_else(|| non_empty(std::env::var("YOUTUBE_API_KEY").ok()))
    }

    /// Generation API key from the file or the provider's environment variable
    pub fn generation_api_key(&self) -> Option<String> {
        non_empty(self.generation.api_key.clone())
            .or_else(|| non_empty(std::env::var(self.generation.provider.config().env_var).ok()))
    }

    /// Directory holding per-user data files
    pub fn data_dir(&self) -> PathBuf {
        self.app.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|dir| dir.join("playlist-scribe"))
                .unwrap_or_else(|| PathBuf::from(".playlist-scribe"))
        })
    }

    pub fn output_dir(&self) -> PathBuf {
        self.app
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn batch_settle(&self) -> Duration {
        Duration::from_secs(self.app.batch_settle_seconds)
    }

    /// Display current configuration
    pub fn display(&self) {
        let provider = self.generation.provider.config();
        let key_state = |key: Option<String>| if key.is_some() { "set" } else { "not set" };

        println!("Current Configuration:");
        println!("  YouTube API: {}", self.youtube.api_base_url);
        println!("  YouTube API Key: {}", key_state(self.youtube_api_key()));
        println!("  Max Items: {}", self.youtube.max_items);
        println!("  Provider: {}", self.generation.provider.name());
        println!(
            "  Model: {}",
            self.generation.model.as_deref().unwrap_or(provider.model)
        );
        println!(
            "  {} Key: {}",
            provider.env_var,
            key_state(self.generation_api_key())
        );
        println!("  Default Language: {}", self.generation.default_language);
        println!("  Data Directory: {}", self.data_dir().display());
        println!("  Output Directory: {}", self.output_dir().display());
        println!("  Batch Settle: {}s", self.app.batch_settle_seconds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let config = Config::load_from(&path).await.unwrap();
        assert_eq!(config, Config::default());
        assert!(path.exists());

        let reloaded = Config::load_from(&path).await.unwrap();
        assert_eq!(reloaded, config);
    }

    #[tokio::test]
    async fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs_err::write(
            &path,
            "generation:\n  provider: grok\n  default_language: German\napp:\n  batch_settle_seconds: 2\n",
        )
        .unwrap();

        let config = Config::load_from(&path).await.unwrap();
        assert_eq!(config.generation.provider, Provider::Grok);
        assert_eq!(config.generation.default_language, "German");
        assert_eq!(config.batch_settle(), Duration::from_secs(2));
        assert_eq!(config.youtube.max_items, 50);
    }

    #[tokio::test]
    async fn test_invalid_values_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        fs_err::write(&path, "youtube:\n  max_items: 0\n").unwrap();
        assert!(Config::load_from(&path).await.is_err());

        fs_err::write(&path, "generation:\n  default_language: Klingon\n").unwrap();
        let err = Config::load_from(&path).await.unwrap_err();
        assert!(err.to_string().contains("Klingon"));
    }

    #[test]
    fn test_configured_key_wins() {
        let mut config = Config::default();
        config.youtube.api_key = Some("from-file".to_string());
        assert_eq!(config.youtube_api_key().as_deref(), Some("from-file"));

        config.app.output_dir = Some(PathBuf::from("/tmp/out"));
        assert_eq!(config.output_dir(), PathBuf::from("/tmp/out"));
    }
}
