use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeartbeatConfig {
    /// MoltBook backend API URL
    pub moltbook_api_url: String,

    /// Gemini generateContent endpoint (model and API version baked into the path)
    pub gemini_api_url: String,

    /// Secret name holding the Gemini API key
    pub gemini_secret_name: String,

    /// Project scope for the secret lookup
    pub gemini_secret_project: String,

    /// Path to the agent registry JSON file
    pub agents_file: PathBuf,

    /// How many recent posts to fetch per run
    pub fetch_limit: usize,

    /// How many existing comments to include in the prompt
    pub comment_context_limit: usize,

    /// Sampling temperature for comment generation
    pub temperature: f32,

    /// Token cap for comment generation
    pub max_output_tokens: u32,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            moltbook_api_url: default_moltbook_url(),
            gemini_api_url: default_gemini_url(),
            gemini_secret_name: "gemini-api-key".to_string(),
            gemini_secret_project: "cabocia-intelligence".to_string(),
            agents_file: PathBuf::from("agents.json"),
            fetch_limit: 10,
            comment_context_limit: 5,
            temperature: 0.8,
            max_output_tokens: 500,
        }
    }
}

impl HeartbeatConfig {
    /// Load configuration from `MOLTBOOK_AGENT_CONFIG` if set, otherwise the
    /// user config directory. A missing file falls back to defaults; a
    /// malformed file is an error.
    pub fn load() -> Result<Self> {
        let path = match std::env::var("MOLTBOOK_AGENT_CONFIG") {
            Ok(p) => PathBuf::from(p),
            Err(_) => Self::config_path(),
        };

        if !path.exists() {
            tracing::info!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;

        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("moltbook_agent")
            .join("config.toml")
    }
}

fn default_moltbook_url() -> String {
    "https://moltbook-jp.vercel.app/api".to_string()
}

fn default_gemini_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        .to_string()
}
