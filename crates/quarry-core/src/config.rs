//! Configuration: `quarry.toml` plus `QUARRY_*` environment overrides.

use std::fmt;
use std::path::Path;

use anyhow::{Context, bail};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

#[derive(Clone, Deserialize)]
pub struct GithubConfig {
    /// Personal access token; absent means unauthenticated access.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_github_api_url")]
    pub api_url: String,
}

impl fmt::Debug for GithubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubConfig")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_url: default_github_api_url(),
        }
    }
}

#[derive(Clone, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
}

impl fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("embedding_model", &self.embedding_model)
            .finish()
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_openai_base_url(),
            model: default_model(),
            embedding_model: default_embedding_model(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

fn default_github_api_url() -> String {
    "https://api.github.com".to_owned()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_owned()
}

fn default_model() -> String {
    "gpt-4".to_owned()
}

fn default_embedding_model() -> String {
    "text-embedding-ada-002".to_owned()
}

fn default_top_k() -> usize {
    4
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("QUARRY_GITHUB_TOKEN") {
            self.github.token = Some(v);
        }
        if let Ok(v) = std::env::var("QUARRY_GITHUB_API_URL") {
            self.github.api_url = v;
        }
        if let Ok(v) = std::env::var("QUARRY_OPENAI_API_KEY") {
            self.openai.api_key = Some(v);
        }
        if let Ok(v) = std::env::var("QUARRY_OPENAI_BASE_URL") {
            self.openai.base_url = v;
        }
        if let Ok(v) = std::env::var("QUARRY_OPENAI_MODEL") {
            self.openai.model = v;
        }
        if let Ok(v) = std::env::var("QUARRY_OPENAI_EMBEDDING_MODEL") {
            self.openai.embedding_model = v;
        }
        if let Ok(v) = std::env::var("QUARRY_RETRIEVAL_TOP_K") {
            if let Ok(top_k) = v.parse::<usize>() {
                self.retrieval.top_k = top_k;
            } else {
                tracing::warn!("ignoring invalid QUARRY_RETRIEVAL_TOP_K value: {v}");
            }
        }
    }

    /// Check settings the pipeline cannot run without.
    ///
    /// # Errors
    ///
    /// Returns an error when the OpenAI key is missing or the retrieval
    /// geometry cannot produce valid chunks.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.openai.api_key.as_deref().is_none_or(str::is_empty) {
            bail!("openai.api_key is required (set QUARRY_OPENAI_API_KEY)");
        }
        if self.retrieval.top_k == 0 {
            bail!("retrieval.top_k must be at least 1");
        }
        if self.retrieval.chunk_size == 0 {
            bail!("retrieval.chunk_size must be at least 1");
        }
        if self.retrieval.chunk_overlap >= self.retrieval.chunk_size {
            bail!("retrieval.chunk_overlap must be smaller than retrieval.chunk_size");
        }
        Ok(())
    }
}
