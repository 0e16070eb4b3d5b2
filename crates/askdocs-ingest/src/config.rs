//! Configuration for the ingestion pipeline
//!
//! Everything is sourced from environment variables (a `.env` file works via
//! dotenvy). Only credentials and source locations are required; endpoints
//! and tuning knobs carry defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Top-level ingestion configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct IngestConfig {
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub pinecone: PineconeConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// GitHub GraphQL source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    /// Personal access token sent as a bearer credential
    #[serde(default)]
    pub token: String,

    /// Repository to ingest, as "owner/name"
    #[serde(default)]
    pub repo: String,

    /// GraphQL endpoint
    #[serde(default = "default_graphql_url")]
    pub graphql_url: String,

    /// Extra attempts after a failed search request
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Cap on pages fetched per traversal; `None` means unbounded
    #[serde(default)]
    pub max_pages: Option<u32>,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            repo: String::new(),
            graphql_url: default_graphql_url(),
            max_retries: default_max_retries(),
            max_pages: None,
        }
    }
}

/// Documentation site scraper configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Sitemap feed listing every page to scrape
    #[serde(default)]
    pub sitemap_url: String,

    /// User agent presented to the documentation site
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            sitemap_url: String::new(),
            user_agent: default_user_agent(),
        }
    }
}

/// OpenAI embeddings configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default)]
    pub api_key: String,

    /// API base, without a trailing slash
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_openai_base_url(),
            model: default_embedding_model(),
            dimensions: default_dimensions(),
        }
    }
}

/// Pinecone index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PineconeConfig {
    #[serde(default)]
    pub api_key: String,

    /// Index name, created on first run if absent
    #[serde(default = "default_index_name")]
    pub index: String,

    /// Control plane endpoint; the data plane host is resolved per index
    #[serde(default = "default_pinecone_control_url")]
    pub control_url: String,

    #[serde(default = "default_dimensions")]
    pub dimension: usize,

    #[serde(default = "default_cloud")]
    pub cloud: String,

    #[serde(default = "default_region")]
    pub region: String,
}

impl Default for PineconeConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            index: default_index_name(),
            control_url: default_pinecone_control_url(),
            dimension: default_dimensions(),
            cloud: default_cloud(),
            region: default_region(),
        }
    }
}

/// Local storage for intermediate step output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding one JSON file per pipeline step
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
        }
    }
}

fn default_graphql_url() -> String {
    "https://api.github.com/graphql".to_string()
}

fn default_max_retries() -> u32 {
    2
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_dimensions() -> usize {
    1536
}

fn default_index_name() -> String {
    "askdocs".to_string()
}

fn default_pinecone_control_url() -> String {
    "https://api.pinecone.io".to_string()
}

fn default_cloud() -> String {
    "aws".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_base_dir() -> PathBuf {
    PathBuf::from("data")
}

impl IngestConfig {
    /// Build a configuration from environment variables.
    ///
    /// Required: `GITHUB_TOKEN`, `GITHUB_REPO`, `SITEMAP_URL`,
    /// `OPENAI_API_KEY`, `PINECONE_API_KEY`. Optional overrides:
    /// `PINECONE_INDEX`, `INGEST_DATA_DIR`, `GITHUB_MAX_PAGES`.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        config.github.token = require_env("GITHUB_TOKEN")?;
        config.github.repo = require_env("GITHUB_REPO")?;
        config.scraper.sitemap_url = require_env("SITEMAP_URL")?;
        config.openai.api_key = require_env("OPENAI_API_KEY")?;
        config.pinecone.api_key = require_env("PINECONE_API_KEY")?;

        if let Ok(index) = std::env::var("PINECONE_INDEX") {
            config.pinecone.index = index;
        }
        if let Ok(dir) = std::env::var("INGEST_DATA_DIR") {
            config.storage.base_dir = PathBuf::from(dir);
        }
        if let Ok(pages) = std::env::var("GITHUB_MAX_PAGES") {
            let pages = pages
                .parse()
                .map_err(|_| Error::config(format!("GITHUB_MAX_PAGES is not a number: {}", pages)))?;
            config.github.max_pages = Some(pages);
        }

        Ok(config)
    }
}

fn require_env(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| Error::config(format!("{} is not set", name)))
}
