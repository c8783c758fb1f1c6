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

use async_trait::async_trait;
use orgkb_core::{RetrievalError, UpstreamStage};
use orgkb_query::Embedder;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Embedding client for an Ollama-style `/api/embed` endpoint.
pub struct HttpEmbedder {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl HttpEmbedder {
    pub fn new(
        base_url: &str,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/api/embed", base_url.trim_end_matches('/')),
            model: model.into(),
        })
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn encode(&self, text: &str) -> Result<Vec<f32>, RetrievalError> {
        let mut vectors = self.encode_batch(&[text.to_string()]).await?;
        if vectors.is_empty() {
            return Err(RetrievalError::decode(
                UpstreamStage::Embedding,
                "response contained no embeddings",
            ));
        }
        Ok(vectors.swap_remove(0))
    }

    async fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RetrievalError> {
        let request = EmbedRequest {
            model: &self.model,
            input: texts,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| RetrievalError::upstream(UpstreamStage::Embedding, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RetrievalError::upstream(
                UpstreamStage::Embedding,
                format!("status {}", status),
            ));
        }

        let body: EmbedResponse = response
            .json()
            .await
            .map_err(|e| RetrievalError::decode(UpstreamStage::Embedding, e.to_string()))?;

        if body.embeddings.len() != texts.len() {
            return Err(RetrievalError::decode(
                UpstreamStage::Embedding,
                format!(
                    "expected {} embeddings, got {}",
                    texts.len(),
                    body.embeddings.len()
                ),
            ));
        }

        Ok(body.embeddings)
    }
}
