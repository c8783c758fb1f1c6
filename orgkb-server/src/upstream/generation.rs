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

//! Client for an Ollama-style `/api/generate` endpoint.
//!
//! Streaming responses are newline-delimited JSON fragments, each carrying a
//! `response` field; concatenating the fields reconstructs the full answer.
//! Once streaming has started, a mid-stream connection loss is treated as
//! end-of-stream (logged, not surfaced), matching how callers consume the
//! channel.

use async_trait::async_trait;
use futures::StreamExt;
use orgkb_core::{Entity, RetrievalError, UpstreamStage};
use orgkb_prompts::name_extraction_prompt;
use orgkb_query::EntityRecognizer;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateFragment {
    #[serde(default)]
    response: String,
}

/// One NDJSON stream line -> its token, if the line carries one.
fn parse_stream_line(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str::<GenerateFragment>(line) {
        Ok(fragment) if !fragment.response.is_empty() => Some(fragment.response),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!(error = %e, "skipping malformed stream line");
            None
        }
    }
}

pub struct OllamaGenerator {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl OllamaGenerator {
    pub fn new(
        base_url: &str,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/api/generate", base_url.trim_end_matches('/')),
            model: model.into(),
        })
    }

    async fn send(&self, prompt: &str, stream: bool) -> Result<reqwest::Response, RetrievalError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| RetrievalError::upstream(UpstreamStage::Generation, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RetrievalError::upstream(
                UpstreamStage::Generation,
                format!("status {}", status),
            ));
        }
        Ok(response)
    }

    /// Full answer in one round trip.
    pub async fn generate(&self, prompt: &str) -> Result<String, RetrievalError> {
        let response = self.send(prompt, false).await?;
        let body: GenerateFragment = response
            .json()
            .await
            .map_err(|e| RetrievalError::decode(UpstreamStage::Generation, e.to_string()))?;
        Ok(body.response.trim().to_string())
    }

    /// Token stream. Errors before the first byte are surfaced; afterwards
    /// the channel simply closes.
    pub async fn stream(&self, prompt: &str) -> Result<mpsc::Receiver<String>, RetrievalError> {
        let response = self.send(prompt, true).await?;
        let (tx, rx) = mpsc::channel(100);
        tokio::spawn(forward_ndjson(response.bytes_stream(), tx));
        Ok(rx)
    }
}

/// Drains an NDJSON byte stream into the token channel. An `Err` item after
/// bytes have flowed closes the channel instead of failing the request; a
/// trailing fragment without a final newline is still flushed.
async fn forward_ndjson<S, B, E>(stream: S, tx: mpsc::Sender<String>)
where
    S: futures::Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    tokio::pin!(stream);
    let mut buffer = String::new();

    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                tracing::warn!(error = %e, "generation stream interrupted");
                break;
            }
        };
        buffer.push_str(&String::from_utf8_lossy(chunk.as_ref()));

        while let Some(pos) = buffer.find('\n') {
            let line: String = buffer.drain(..=pos).collect();
            if let Some(token) = parse_stream_line(&line) {
                if tx.send(token).await.is_err() {
                    return;
                }
            }
        }
    }

    if let Some(token) = parse_stream_line(&buffer) {
        let _ = tx.send(token).await;
    }
}

/// Entity recognizer that asks the generation model to pull an organization
/// name out of the question. Upstream trouble degrades to "no entities";
/// recognition is never allowed to fail a request.
pub struct ModelEntityRecognizer {
    generator: Arc<OllamaGenerator>,
}

impl ModelEntityRecognizer {
    pub fn new(generator: Arc<OllamaGenerator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl EntityRecognizer for ModelEntityRecognizer {
    async fn extract(&self, text: &str) -> Vec<Entity> {
        let prompt = name_extraction_prompt(text);
        match self.generator.generate(&prompt).await {
            Ok(answer) => {
                let name = answer.trim();
                if name.is_empty() || name.eq_ignore_ascii_case("none") {
                    return vec![];
                }
                vec![Entity {
                    text: name.to_string(),
                    label: "ORG".to_string(),
                }]
            }
            Err(e) => {
                tracing::warn!(error = %e, "name extraction failed, continuing without entities");
                vec![]
            }
        }
    }
}
