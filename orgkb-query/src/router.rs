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

//! Hybrid retrieval routing.
//!
//! One question, one context block. The router embeds the question, takes
//! the best vector hit, and accepts it when the similarity clears the
//! threshold. Below the threshold it tries the structured fallback: if the
//! question looks like an organization lookup and the recognizer finds a
//! name, a fixed-shape query against the structured store supplies the
//! context instead. When neither path yields content the result is empty
//! with [`ContextSource::None`], which is a degraded success, not an error.

use crate::builder::QueryBuilder;
use crate::recognizer::EntityRecognizer;
use moka::sync::Cache;
use orgkb_core::{ContextSource, RetrievalError, RetrievalResult};
use orgkb_index::EmbeddingIndex;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;

/// One result row from the structured store, variable name to bound value.
pub type BindingRow = HashMap<String, String>;

/// Turns text into a vector.
#[async_trait::async_trait]
pub trait Embedder: Send + Sync {
    async fn encode(&self, text: &str) -> Result<Vec<f32>, RetrievalError>;

    async fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RetrievalError>;
}

/// Executes a SELECT query and returns its bindings.
#[async_trait::async_trait]
pub trait StructuredStore: Send + Sync {
    async fn select(&self, query: &str) -> Result<Vec<BindingRow>, RetrievalError>;
}

/// Routing knobs, loaded from configuration.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Minimum cosine similarity for the vector path to win.
    pub similarity_threshold: f32,

    /// Patterns that mark a question as an organization lookup, tried in
    /// order against the lowercased question.
    pub organization_patterns: Vec<String>,

    /// Capacity of the query-embedding cache.
    pub embedding_cache_capacity: u64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.6,
            organization_patterns: vec![
                "công ty".to_string(),
                "doanh nghiệp".to_string(),
                "tập đoàn".to_string(),
                "thông tin về".to_string(),
            ],
            embedding_cache_capacity: 1024,
        }
    }
}

/// Labels shown in the formatted organization block, paired with the
/// binding variable that supplies each line.
const ORGANIZATION_FIELDS: &[(&str, &str)] = &[
    ("name", "Name"),
    ("type", "Type"),
    ("address", "Address"),
    ("business", "Business"),
    ("registered", "Registered"),
];

pub struct RetrievalRouter<E, S> {
    embedder: Arc<E>,
    store: Arc<S>,
    recognizer: Arc<dyn EntityRecognizer>,
    builder: QueryBuilder,
    org_patterns: Vec<Regex>,
    similarity_threshold: f32,
    query_cache: Cache<String, Vec<f32>>,
}

impl<E: Embedder, S: StructuredStore> RetrievalRouter<E, S> {
    pub fn new(
        embedder: Arc<E>,
        store: Arc<S>,
        recognizer: Arc<dyn EntityRecognizer>,
        builder: QueryBuilder,
        config: &RouterConfig,
    ) -> Result<Self, regex::Error> {
        let org_patterns = config
            .organization_patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            embedder,
            store,
            recognizer,
            builder,
            org_patterns,
            similarity_threshold: config.similarity_threshold,
            query_cache: Cache::new(config.embedding_cache_capacity),
        })
    }

    /// Retrieve the context block for one question.
    ///
    /// Errors only on invalid input or an upstream failure; an empty index
    /// or a miss on both paths returns [`RetrievalResult::none`].
    pub async fn retrieve(
        &self,
        index: &EmbeddingIndex,
        question: &str,
    ) -> Result<RetrievalResult, RetrievalError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(RetrievalError::InvalidInput(
                "question must not be empty".to_string(),
            ));
        }

        let query_vector = self.embed_cached(question).await?;

        if let Some((i, score)) = index.top1(&query_vector) {
            if score >= self.similarity_threshold {
                if let Some(preview) = index.metadata(i).map(|m| m.preview.as_str()) {
                    if !preview.is_empty() {
                        tracing::debug!(score, chunk = i, "vector hit accepted");
                        return Ok(RetrievalResult {
                            context_text: preview.to_string(),
                            source: ContextSource::Vector,
                        });
                    }
                }
            } else {
                tracing::debug!(
                    score,
                    threshold = self.similarity_threshold,
                    "vector hit below threshold"
                );
            }
        }

        if self.is_organization_question(question) {
            if let Some(entity) = self.recognizer.extract(question).await.into_iter().next() {
                let query = self.builder.lookup_by_name(&entity.text);
                let rows = self.store.select(&query).await?;
                if let Some(row) = rows.first() {
                    return Ok(RetrievalResult {
                        context_text: format_organization_block(row),
                        source: ContextSource::Structured,
                    });
                }
                tracing::debug!(name = %entity.text, "structured lookup found no rows");
            }
        }

        Ok(RetrievalResult::none())
    }

    fn is_organization_question(&self, question: &str) -> bool {
        let lowered = question.to_lowercase();
        self.org_patterns.iter().any(|p| p.is_match(&lowered))
    }

    async fn embed_cached(&self, question: &str) -> Result<Vec<f32>, RetrievalError> {
        if let Some(hit) = self.query_cache.get(question) {
            return Ok(hit);
        }
        let vector = self.embedder.encode(question).await?;
        self.query_cache
            .insert(question.to_string(), vector.clone());
        Ok(vector)
    }
}

/// Render one binding row as a labeled block, one line per bound field,
/// under an "Organization Information:" heading.
fn format_organization_block(row: &BindingRow) -> String {
    let mut lines = Vec::new();
    for (var, label) in ORGANIZATION_FIELDS {
        if let Some(value) = row.get(*var) {
            if !value.is_empty() {
                lines.push(format!("{}: {}", label, value));
            }
        }
    }
    if lines.is_empty() {
        return String::new();
    }
    format!("Organization Information:\n{}", lines.join("\n"))
}
