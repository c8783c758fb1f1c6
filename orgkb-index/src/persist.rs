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

//! Index persistence: gzip-compressed bincode archive.
//!
//! The on-disk layout is three named arrays (embeddings, metadata, texts)
//! with equal first-dimension length. A missing file is not an error; the
//! service bootstraps from an empty index.

use crate::index::{EmbeddingIndex, IndexError};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use orgkb_core::ChunkMetadata;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

#[derive(Serialize, Deserialize)]
struct PersistedIndex {
    embeddings: Vec<Vec<f32>>,
    metadata: Vec<ChunkMetadata>,
    texts: Vec<String>,
}

impl EmbeddingIndex {
    /// Load an index from `path`. Returns an empty index when the file does
    /// not exist; a file that exists but cannot be decoded is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, IndexError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!(path = %path.display(), "no persisted index, starting empty");
            return Ok(Self::empty());
        }

        let file = File::open(path)?;
        let decoder = GzDecoder::new(BufReader::new(file));
        let persisted: PersistedIndex =
            bincode::deserialize_from(decoder).map_err(|e| IndexError::Codec(e.to_string()))?;

        let index =
            Self::from_parts(persisted.embeddings, persisted.texts, persisted.metadata)?;
        tracing::info!(
            path = %path.display(),
            chunks = index.len(),
            "loaded persisted index"
        );
        Ok(index)
    }

    /// Persist the index to `path`, creating parent directories as needed.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), IndexError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let (embeddings, texts, metadata) = self.clone().into_parts();
        let persisted = PersistedIndex {
            embeddings,
            metadata,
            texts,
        };

        let file = File::create(path)?;
        let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        bincode::serialize_into(&mut encoder, &persisted)
            .map_err(|e| IndexError::Codec(e.to_string()))?;
        encoder.finish()?;

        tracing::debug!(path = %path.display(), chunks = self.len(), "saved index");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orgkb_core::Chunk;

    fn chunk(id: &str, vector: Vec<f32>) -> Chunk {
        Chunk {
            id: id.to_string(),
            text: format!("nội dung của {id}"),
            vector,
            metadata: ChunkMetadata {
                source: "handbook.txt".to_string(),
                section_id: 7,
                section_title: "Điều 7".to_string(),
                preview: "thời gian bảo hành là 12 tháng".to_string(),
            },
        }
    }

    #[test]
    fn load_missing_file_yields_empty_index() {
        let dir = tempfile::tempdir().unwrap();
        let index = EmbeddingIndex::load(dir.path().join("absent.bin.gz")).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn save_then_load_round_trips_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.bin.gz");

        let index = EmbeddingIndex::empty()
            .merge(&[
                chunk("a", vec![0.25, -1.5, 3.0]),
                chunk("b", vec![f32::MIN_POSITIVE, 0.1, -0.1]),
            ])
            .unwrap();

        index.save(&path).unwrap();
        let loaded = EmbeddingIndex::load(&path).unwrap();

        // Bit-identical vectors, texts, metadata, order preserved.
        assert_eq!(loaded, index);
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/data/index.bin.gz");
        EmbeddingIndex::empty().save(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.bin.gz");
        std::fs::write(&path, b"not a gzip archive").unwrap();
        assert!(matches!(
            EmbeddingIndex::load(&path),
            Err(IndexError::Codec(_)) | Err(IndexError::Io(_))
        ));
    }
}
