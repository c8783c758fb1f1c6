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

use axum::extract::State;
use axum::Json;
use orgkb_core::Chunk;
use orgkb_index::split_into_sections;
use orgkb_query::Embedder;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    /// Name of the source document, recorded in chunk metadata
    pub filename: String,
    /// Extracted plain text of the document
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub message: String,
    pub new_chunk_count: usize,
    pub total_chunk_count: usize,
}

/// POST /upload
///
/// Splits the document into sections, embeds them, merges the new chunks
/// into a fresh index snapshot, persists it, and publishes it atomically.
pub async fn upload(
    State(state): State<AppState>,
    Json(request): Json<UploadRequest>,
) -> Result<Json<UploadResponse>, ApiError> {
    if request.text.trim().is_empty() {
        return Err(ApiError::BadRequest("document text cannot be empty".into()));
    }
    let filename = if request.filename.trim().is_empty() {
        "untitled".to_string()
    } else {
        request.filename.trim().to_string()
    };

    let sections = split_into_sections(&request.text);
    if sections.is_empty() {
        return Err(ApiError::BadRequest(
            "document contained no extractable sections".into(),
        ));
    }

    let texts: Vec<String> = sections.iter().map(|s| s.combined_text()).collect();
    let vectors = state.embedder.encode_batch(&texts).await?;
    if vectors.len() != texts.len() {
        return Err(ApiError::Upstream(format!(
            "embedding returned {} vectors for {} sections",
            vectors.len(),
            texts.len()
        )));
    }

    let chunks: Vec<Chunk> = sections
        .iter()
        .zip(texts.iter().zip(vectors))
        .enumerate()
        .map(|(i, (section, (text, vector)))| Chunk {
            id: format!("{}#{}", filename, i),
            text: text.clone(),
            vector,
            metadata: section.metadata(&filename, i),
        })
        .collect();
    let new_chunk_count = chunks.len();

    // One writer at a time; readers keep their snapshots throughout.
    let _guard = state.index.write_lock().await;
    let current = state.index.current();
    let merged = current
        .merge(&chunks)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    // Gzip compression and the file write are blocking; keep them off the
    // async workers while the writer lock is held.
    let merged = Arc::new(merged);
    let to_save = Arc::clone(&merged);
    let index_path = state.index_path.clone();
    tokio::task::spawn_blocking(move || to_save.save(&index_path))
        .await
        .map_err(|e| ApiError::Internal(format!("index save task failed: {}", e)))?
        .map_err(|e| ApiError::Internal(format!("failed to persist index: {}", e)))?;

    let total_chunk_count = merged.len();
    state.index.publish(merged);

    tracing::info!(
        source = %filename,
        added = new_chunk_count,
        total = total_chunk_count,
        "document indexed"
    );

    Ok(Json(UploadResponse {
        message: format!("Indexed {} sections from {}", new_chunk_count, filename),
        new_chunk_count,
        total_chunk_count,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use orgkb_core::ChunkMetadata;
    use orgkb_index::EmbeddingIndex;

    #[tokio::test]
    async fn index_save_round_trips_through_the_blocking_pool() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("embeddings.bin.gz");

        let index = Arc::new(
            EmbeddingIndex::empty()
                .merge(&[Chunk {
                    id: "doc#0".to_string(),
                    text: "warranty terms".to_string(),
                    vector: vec![1.0, 0.0],
                    metadata: ChunkMetadata {
                        source: "doc".to_string(),
                        section_id: 0,
                        section_title: "Terms".to_string(),
                        preview: "warranty terms".to_string(),
                    },
                }])
                .unwrap(),
        );

        let to_save = Arc::clone(&index);
        let saved_path = path.clone();
        tokio::task::spawn_blocking(move || to_save.save(&saved_path))
            .await
            .unwrap()
            .unwrap();

        let reloaded = EmbeddingIndex::load(&path).unwrap();
        assert_eq!(reloaded.len(), index.len());
    }

    #[test]
    fn response_uses_camel_case_wire_names() {
        let response = UploadResponse {
            message: "ok".to_string(),
            new_chunk_count: 2,
            total_chunk_count: 5,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["newChunkCount"], 2);
        assert_eq!(json["totalChunkCount"], 5);
    }
}
