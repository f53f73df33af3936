use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::generation::ModelIdentifier;

/// Environment variable holding the generation service credential
pub const API_KEY_ENV: &str = "API_KEY";

const APP_DIR: &str = "video-comparator";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Generative-text service settings
    pub generation: GenerationConfig,

    /// Transcript retrieval settings
    pub transcripts: TranscriptConfig,

    /// Last-comparison persistence
    pub store: StoreConfig,

    /// Application settings
    pub app: AppConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Base URL of the Gemini REST API
    pub api_base_url: String,

    /// Model used when none is given on the command line
    pub default_model: ModelIdentifier,

    /// Optional transport timeout for a single generation call
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptConfig {
    /// yt-dlp executable
    pub yt_dlp_path: String,

    /// Caption languages in order of preference
    pub languages: Vec<String>,

    /// Fall back to automatically generated captions
    pub include_auto_captions: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Persist the CSV of every comparison
    pub enabled: bool,

    /// Root directory of the document store (platform data dir if not set)
    pub path: Option<PathBuf>,

    /// Collection holding the slot
    pub collection: String,

    /// Document id of the slot
    pub document_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Videos compared when no URLs are given
    pub default_video_urls: [String; 2],

    /// File name of the CSV download
    pub csv_file_name: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://generativelanguage.googleapis.com".to_string(),
            default_model: ModelIdentifier::default(),
            request_timeout_secs: None,
        }
    }
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            yt_dlp_path: "yt-dlp".to_string(),
            languages: vec!["en".to_string()],
            include_auto_captions: true,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
            collection: "comparisons".to_string(),
            document_id: "last_comparison".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_video_urls: [
                "https://www.youtube.com/watch?v=vXIAB_1FEC0".to_string(),
                "https://www.youtube.com/watch?v=MRtg6A1f2Ko".to_string(),
            ],
            csv_file_name: "comparison_table.csv".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file or create default
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Self::default();
            config.save_to(&config_path)?;
            tracing::info!("Wrote default configuration to {}", config_path.display());
            Ok(config)
        }
    }

    /// Load and validate a configuration file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs_err::read_to_string(path).context("Failed to read config file")?;

        let config: Config =
            serde_yaml::from_str(&content).context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;

        fs_err::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    pub fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir().context("Could not determine config directory")?;

        Ok(config_dir.join(APP_DIR).join("config.yaml"))
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.generation.api_base_url.trim().is_empty() {
            anyhow::bail!("generation.api_base_url must be configured");
        }

        if self.transcripts.languages.is_empty() {
            anyhow::bail!("At least one transcript language must be configured");
        }

        if self.store.collection.trim().is_empty() || self.store.document_id.trim().is_empty() {
            anyhow::bail!("store.collection and store.document_id must not be empty");
        }

        Ok(())
    }

    /// Root directory of the document store
    pub fn store_root(&self) -> Result<PathBuf> {
        if let Some(path) = &self.store.path {
            return Ok(path.clone());
        }

        let data_dir = dirs::data_dir().context("Could not determine data directory")?;
        Ok(data_dir.join(APP_DIR).join("store"))
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Gemini API: {}", self.generation.api_base_url);
        println!("  Default Model: {}", self.generation.default_model);
        if let Some(timeout) = self.generation.request_timeout_secs {
            println!("  Request Timeout: {}s", timeout);
        }
        println!("  Caption Languages: {}", self.transcripts.languages.join(", "));
        println!("  Auto Captions: {}", self.transcripts.include_auto_captions);
        println!("  Store Enabled: {}", self.store.enabled);
        match self.store_root() {
            Ok(root) => println!("  Store Path: {}", root.display()),
            Err(e) => println!("  Store Path: unavailable ({})", e),
        }
        println!("  Store Slot: {}/{}", self.store.collection, self.store.document_id);
        println!("  CSV File: {}", self.app.csv_file_name);
    }
}
