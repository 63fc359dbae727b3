//! Persistent configuration at ~/.config/cli-programs/gen-reel.toml.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

fn default_voice_id() -> String {
    "21m00Tcm4TlvDq8ikWAM".to_string()
}

fn default_voice_model() -> String {
    "eleven_multilingual_v2".to_string()
}

fn default_text_model() -> String {
    "deepseek-chat".to_string()
}

fn default_min_words() -> usize {
    60
}

fn default_max_words() -> usize {
    130
}

fn default_max_chunks() -> usize {
    8
}

fn default_max_concurrent_calls() -> usize {
    4
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenReelConfig {
    #[serde(default = "default_voice_id")]
    pub voice_id: String,

    #[serde(default = "default_voice_model")]
    pub voice_model: String,

    /// Speech rate multiplier (0.5-2.0); provider default when unset
    #[serde(default)]
    pub speaking_rate: Option<f32>,

    #[serde(default = "default_text_model")]
    pub text_model: String,

    #[serde(default = "default_min_words")]
    pub min_words_per_chunk: usize,

    #[serde(default = "default_max_words")]
    pub max_words_per_chunk: usize,

    #[serde(default = "default_max_chunks")]
    pub max_chunks: usize,

    #[serde(default = "default_max_concurrent_calls")]
    pub max_concurrent_calls: usize,

    /// Assemble whatever units succeeded instead of failing the job
    #[serde(default)]
    pub allow_partial_output: bool,

    /// Job storage root; platform data dir when unset
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

impl Default for GenReelConfig {
    fn default() -> Self {
        Self {
            voice_id: default_voice_id(),
            voice_model: default_voice_model(),
            speaking_rate: None,
            text_model: default_text_model(),
            min_words_per_chunk: default_min_words(),
            max_words_per_chunk: default_max_words(),
            max_chunks: default_max_chunks(),
            max_concurrent_calls: default_max_concurrent_calls(),
            allow_partial_output: false,
            output_dir: None,
        }
    }
}

impl GenReelConfig {
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("could not determine config directory")?;
        Ok(config_dir.join("cli-programs").join("gen-reel.toml"))
    }

    /// Load the config file, falling back to defaults when absent.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config at {}", path.display()))
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("failed to serialize config")?;
        fs::write(&path, content)
            .with_context(|| format!("failed to write config to {}", path.display()))?;
        Ok(())
    }
}
