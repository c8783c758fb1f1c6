// Copyright 2025 OrgKB Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use anyhow::Result;
use orgkb_core::Vocabulary;
use orgkb_query::RouterConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// OrgKB server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: HttpServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    /// Class/predicate vocabulary for query synthesis
    #[serde(default)]
    pub vocabulary: Vocabulary,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpServerConfig {
    /// HTTP API listen address (e.g., "127.0.0.1:8000")
    #[serde(default = "default_http_addr")]
    pub listen_addr: String,

    /// Enable CORS
    #[serde(default = "default_enable_cors")]
    pub enable_cors: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory holding the persisted embedding index
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// Base URL of the Ollama-style model server
    #[serde(default = "default_model_base_url")]
    pub model_base_url: String,

    /// Embedding model name
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Generation model name
    #[serde(default = "default_generation_model")]
    pub generation_model: String,

    /// SPARQL SELECT endpoint of the triple store
    #[serde(default = "default_store_url")]
    pub store_url: String,

    /// Per-request timeout in seconds for the embedding and store clients
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Timeout in seconds for (possibly long) generation requests
    #[serde(default = "default_generation_timeout")]
    pub generation_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetrievalConfig {
    /// Minimum cosine similarity for the vector path
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    /// Patterns marking a question as an organization lookup
    #[serde(default = "default_organization_patterns")]
    pub organization_patterns: Vec<String>,

    /// Known organization names for the keyword recognizer
    #[serde(default)]
    pub known_organizations: Vec<String>,

    /// Use the generation model for name extraction instead of the
    /// keyword list
    #[serde(default)]
    pub model_entity_recognizer: bool,

    /// Query-embedding cache capacity
    #[serde(default = "default_embedding_cache_capacity")]
    pub embedding_cache_capacity: u64,
}

// Default values
fn default_http_addr() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_enable_cors() -> bool {
    true
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./orgkb-data")
}

fn default_model_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_embedding_model() -> String {
    "all-minilm".to_string()
}

fn default_generation_model() -> String {
    "llama3.1:8b".to_string()
}

fn default_store_url() -> String {
    "http://localhost:3030/orgkb/query".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_generation_timeout() -> u64 {
    300
}

fn default_similarity_threshold() -> f32 {
    0.6
}

fn default_organization_patterns() -> Vec<String> {
    RouterConfig::default().organization_patterns
}

fn default_embedding_cache_capacity() -> u64 {
    1024
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_http_addr(),
            enable_cors: default_enable_cors(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            model_base_url: default_model_base_url(),
            embedding_model: default_embedding_model(),
            generation_model: default_generation_model(),
            store_url: default_store_url(),
            request_timeout_secs: default_request_timeout(),
            generation_timeout_secs: default_generation_timeout(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            organization_patterns: default_organization_patterns(),
            known_organizations: vec![],
            model_entity_recognizer: false,
            embedding_cache_capacity: default_embedding_cache_capacity(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server: HttpServerConfig::default(),
            storage: StorageConfig::default(),
            upstream: UpstreamConfig::default(),
            retrieval: RetrievalConfig::default(),
            vocabulary: Vocabulary::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        // Deserialization bypasses Vocabulary::new, so restore the keyword
        // normalization invariant here.
        config.vocabulary = config.vocabulary.normalized();
        Ok(config)
    }

    /// Load configuration with priority: file > env > defaults
    pub fn load(config_file: Option<PathBuf>) -> Result<Self> {
        let mut config = if let Some(path) = config_file {
            if path.exists() {
                tracing::info!("Loading configuration from file: {:?}", path);
                Self::from_file(&path)?
            } else {
                tracing::warn!("Config file not found: {:?}, using defaults", path);
                Self::default()
            }
        } else {
            Self::default()
        };

        config = Self::merge_with_env(config);
        config.validate()?;
        Ok(config)
    }

    /// Merge config with environment variables (env takes priority)
    ///
    /// Supported environment variables:
    /// - ORGKB_HTTP_ADDR: HTTP listen address
    /// - ORGKB_DATA_DIR: Data directory path
    /// - ORGKB_MODEL_BASE_URL: Ollama-style model server base URL
    /// - ORGKB_EMBEDDING_MODEL / ORGKB_GENERATION_MODEL: model names
    /// - ORGKB_STORE_URL: SPARQL SELECT endpoint
    /// - ORGKB_SIMILARITY_THRESHOLD: vector-path acceptance threshold
    /// - ORGKB_ENABLE_CORS: enable CORS (default: true)
    fn merge_with_env(mut config: Self) -> Self {
        if let Ok(addr) = std::env::var("ORGKB_HTTP_ADDR") {
            config.server.listen_addr = addr;
        }
        if let Ok(cors) = std::env::var("ORGKB_ENABLE_CORS") {
            config.server.enable_cors = cors.parse().unwrap_or(true);
        }
        if let Ok(data_dir) = std::env::var("ORGKB_DATA_DIR") {
            config.storage.data_dir = PathBuf::from(data_dir);
        }
        if let Ok(url) = std::env::var("ORGKB_MODEL_BASE_URL") {
            config.upstream.model_base_url = url;
        }
        if let Ok(model) = std::env::var("ORGKB_EMBEDDING_MODEL") {
            config.upstream.embedding_model = model;
        }
        if let Ok(model) = std::env::var("ORGKB_GENERATION_MODEL") {
            config.upstream.generation_model = model;
        }
        if let Ok(url) = std::env::var("ORGKB_STORE_URL") {
            config.upstream.store_url = url;
        }
        if let Ok(threshold) = std::env::var("ORGKB_SIMILARITY_THRESHOLD") {
            if let Ok(val) = threshold.parse() {
                config.retrieval.similarity_threshold = val;
            }
        }
        config
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        self.socket_addr()?;
        if !(0.0..=1.0).contains(&self.retrieval.similarity_threshold) {
            anyhow::bail!(
                "similarity_threshold must be within [0, 1], got {}",
                self.retrieval.similarity_threshold
            );
        }
        if self.upstream.model_base_url.is_empty() || self.upstream.store_url.is_empty() {
            anyhow::bail!("upstream URLs must not be empty");
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.server
            .listen_addr
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid listen address '{}': {}", self.server.listen_addr, e))
    }

    /// Router knobs derived from the retrieval section.
    pub fn router_config(&self) -> RouterConfig {
        RouterConfig {
            similarity_threshold: self.retrieval.similarity_threshold,
            organization_patterns: self.retrieval.organization_patterns.clone(),
            embedding_cache_capacity: self.retrieval.embedding_cache_capacity,
        }
    }

    /// Path of the persisted embedding index.
    pub fn index_path(&self) -> PathBuf {
        self.storage.data_dir.join("embeddings.bin.gz")
    }
}
