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

pub mod ask;
pub mod health;
pub mod upload;

pub use ask::{ask, ask_stream};
pub use health::health_check;
pub use upload::upload;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use orgkb_core::RetrievalError;
use orgkb_index::EmbeddingIndex;
use orgkb_prompts::PromptAssembler;
use orgkb_query::{QueryBuilder, QuestionParser, RetrievalRouter};
use parking_lot::RwLock;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use crate::upstream::{HttpEmbedder, OllamaGenerator, SparqlStore};

/// API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Upstream failure: {0}")]
    Upstream(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<RetrievalError> for ApiError {
    fn from(err: RetrievalError) -> Self {
        match err {
            RetrievalError::InvalidInput(msg) => ApiError::BadRequest(msg),
            other => ApiError::Upstream(other.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Published embedding-index snapshot plus the single-writer gate.
///
/// Readers clone the current `Arc` and search it without blocking the
/// writer; the writer builds a merged copy, persists it, then swaps the
/// pointer. The tokio mutex serializes concurrent uploads.
pub struct IndexHandle {
    snapshot: RwLock<Arc<EmbeddingIndex>>,
    writer: tokio::sync::Mutex<()>,
}

impl IndexHandle {
    pub fn new(index: EmbeddingIndex) -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(index)),
            writer: tokio::sync::Mutex::new(()),
        }
    }

    /// The snapshot current at the time of the call.
    pub fn current(&self) -> Arc<EmbeddingIndex> {
        self.snapshot.read().clone()
    }

    /// Serialize writers; hold the guard across merge + persist + publish.
    pub async fn write_lock(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.writer.lock().await
    }

    /// Atomically publish a new snapshot.
    pub fn publish(&self, index: Arc<EmbeddingIndex>) {
        *self.snapshot.write() = index;
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub index: Arc<IndexHandle>,
    pub index_path: PathBuf,
    pub parser: Arc<QuestionParser>,
    pub builder: QueryBuilder,
    pub router: Arc<RetrievalRouter<HttpEmbedder, SparqlStore>>,
    pub embedder: Arc<HttpEmbedder>,
    pub store: Arc<SparqlStore>,
    pub generator: Arc<OllamaGenerator>,
    pub assembler: PromptAssembler,
}

#[cfg(test)]
mod tests {
    use super::*;
    use orgkb_core::{Chunk, ChunkMetadata};

    fn chunk(id: &str) -> Chunk {
        Chunk {
            id: id.to_string(),
            text: "text".to_string(),
            vector: vec![1.0, 0.0],
            metadata: ChunkMetadata {
                source: "doc.pdf".to_string(),
                section_id: 0,
                section_title: "S".to_string(),
                preview: "p".to_string(),
            },
        }
    }

    #[test]
    fn old_snapshots_survive_a_publish() {
        let handle = IndexHandle::new(EmbeddingIndex::empty());
        let before = handle.current();

        let merged = before.merge(&[chunk("c1")]).unwrap();
        handle.publish(Arc::new(merged));

        assert_eq!(before.len(), 0);
        assert_eq!(handle.current().len(), 1);
    }

    #[test]
    fn retrieval_error_maps_to_status() {
        let bad: ApiError = RetrievalError::InvalidInput("empty".to_string()).into();
        assert!(matches!(bad, ApiError::BadRequest(_)));

        let upstream: ApiError = RetrievalError::upstream(
            orgkb_core::UpstreamStage::Generation,
            "connection refused",
        )
        .into();
        assert!(matches!(upstream, ApiError::Upstream(_)));
    }
}
