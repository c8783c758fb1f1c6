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

use orgkb_core::{Chunk, ChunkMetadata};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from index persistence and updates.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt index file: {0}")]
    Codec(String),

    #[error("embedding dimension mismatch: index has {expected}, chunk {chunk_id} has {got}")]
    DimensionMismatch {
        expected: usize,
        got: usize,
        chunk_id: String,
    },
}

/// In-memory embedding index over parallel vectors/texts/metadata arrays.
///
/// Invariant: the three collections always have equal length. `merge`
/// extends all three or none.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingIndex {
    embeddings: Vec<Vec<f32>>,
    texts: Vec<String>,
    metadata: Vec<ChunkMetadata>,
}

impl EmbeddingIndex {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }

    /// Dimensionality of the stored vectors; `None` while the index is empty.
    pub fn dimension(&self) -> Option<usize> {
        self.embeddings.first().map(|v| v.len())
    }

    pub fn text(&self, i: usize) -> Option<&str> {
        self.texts.get(i).map(|s| s.as_str())
    }

    pub fn metadata(&self, i: usize) -> Option<&ChunkMetadata> {
        self.metadata.get(i)
    }

    pub(crate) fn from_parts(
        embeddings: Vec<Vec<f32>>,
        texts: Vec<String>,
        metadata: Vec<ChunkMetadata>,
    ) -> Result<Self, IndexError> {
        if embeddings.len() != texts.len() || texts.len() != metadata.len() {
            return Err(IndexError::Codec(format!(
                "parallel arrays have unequal lengths: {} embeddings, {} texts, {} metadata",
                embeddings.len(),
                texts.len(),
                metadata.len()
            )));
        }
        Ok(Self {
            embeddings,
            texts,
            metadata,
        })
    }

    pub(crate) fn into_parts(self) -> (Vec<Vec<f32>>, Vec<String>, Vec<ChunkMetadata>) {
        (self.embeddings, self.texts, self.metadata)
    }

    /// Build a new index whose collections are the element-wise
    /// concatenation of this index followed by `new_chunks`, in order.
    ///
    /// Copy-on-write: the receiver is untouched, so concurrent readers of
    /// the old snapshot are unaffected. Fails without partial effects if a
    /// chunk's dimensionality disagrees with the index (or with the first
    /// new chunk, when the index is empty).
    pub fn merge(&self, new_chunks: &[Chunk]) -> Result<Self, IndexError> {
        let expected = self
            .dimension()
            .or_else(|| new_chunks.first().map(|c| c.dimension()));

        if let Some(expected) = expected {
            for chunk in new_chunks {
                if chunk.dimension() != expected {
                    return Err(IndexError::DimensionMismatch {
                        expected,
                        got: chunk.dimension(),
                        chunk_id: chunk.id.clone(),
                    });
                }
            }
        }

        let mut merged = self.clone();
        for chunk in new_chunks {
            merged.embeddings.push(chunk.vector.clone());
            merged.texts.push(chunk.text.clone());
            merged.metadata.push(chunk.metadata.clone());
        }

        tracing::debug!(
            added = new_chunks.len(),
            total = merged.len(),
            "merged chunks into index"
        );
        Ok(merged)
    }

    /// Exact top-k cosine search. Results are `(chunk index, score)` pairs
    /// ranked by descending similarity; ties keep insertion order (the sort
    /// is stable). Returns at most `k` results, fewer if the index is
    /// smaller, and an empty list for an empty index.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<(usize, f32)> {
        let mut scored: Vec<(usize, f32)> = self
            .embeddings
            .iter()
            .enumerate()
            .map(|(i, v)| (i, cosine_similarity(query, v)))
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        scored
    }

    /// Best single match, if any.
    pub fn top1(&self, query: &[f32]) -> Option<(usize, f32)> {
        self.search(query, 1).into_iter().next()
    }
}

/// Cosine similarity `dot(a,b) / (|a||b|)`.
///
/// Defined as 0 when either vector has (near-)zero magnitude or the lengths
/// disagree, so callers never divide by zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a < 1e-8 || norm_b < 1e-8 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn chunk(id: &str, vector: Vec<f32>) -> Chunk {
        Chunk {
            id: id.to_string(),
            text: format!("text for {id}"),
            vector,
            metadata: ChunkMetadata {
                source: "test.txt".to_string(),
                section_id: 0,
                section_title: "Section".to_string(),
                preview: format!("preview for {id}"),
            },
        }
    }

    #[test]
    fn cosine_of_identical_vectors_is_one() {
        let v = vec![0.3, -1.2, 4.5];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn cosine_of_zero_vector_is_zero() {
        let zero = vec![0.0, 0.0, 0.0];
        let v = vec![1.0, 2.0, 3.0];
        assert_eq!(cosine_similarity(&zero, &v), 0.0);
        assert_eq!(cosine_similarity(&v, &zero), 0.0);
    }

    #[test]
    fn cosine_of_mismatched_lengths_is_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0]), 0.0);
    }

    #[test]
    fn search_on_empty_index_returns_nothing() {
        let index = EmbeddingIndex::empty();
        assert!(index.search(&[1.0, 0.0], 5).is_empty());
        assert!(index.top1(&[1.0, 0.0]).is_none());
    }

    #[test]
    fn search_ranks_by_descending_similarity() {
        let index = EmbeddingIndex::empty()
            .merge(&[
                chunk("a", vec![0.0, 1.0]),
                chunk("b", vec![1.0, 0.0]),
                chunk("c", vec![1.0, 1.0]),
            ])
            .unwrap();

        let results = index.search(&[1.0, 0.0], 3);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].0, 1); // exact match first
        assert!((results[0].1 - 1.0).abs() < 1e-5);
        assert!(results[0].1 >= results[1].1 && results[1].1 >= results[2].1);
    }

    #[test]
    fn search_breaks_ties_by_insertion_order() {
        // Two identical vectors: the earlier one must rank first.
        let index = EmbeddingIndex::empty()
            .merge(&[
                chunk("first", vec![1.0, 0.0]),
                chunk("second", vec![1.0, 0.0]),
            ])
            .unwrap();

        let results = index.search(&[1.0, 0.0], 2);
        assert_eq!(results[0].0, 0);
        assert_eq!(results[1].0, 1);
    }

    #[test]
    fn search_clamps_k_to_index_size() {
        let index = EmbeddingIndex::empty()
            .merge(&[chunk("a", vec![1.0, 0.0])])
            .unwrap();
        assert_eq!(index.search(&[1.0, 0.0], 10).len(), 1);
        assert!(index.search(&[1.0, 0.0], 0).is_empty());
    }

    #[test]
    fn merge_with_empty_slice_is_identity() {
        let index = EmbeddingIndex::empty()
            .merge(&[chunk("a", vec![1.0, 0.0])])
            .unwrap();
        let merged = index.merge(&[]).unwrap();
        assert_eq!(merged, index);
    }

    #[test]
    fn merge_appends_in_order_and_preserves_invariant() {
        let index = EmbeddingIndex::empty()
            .merge(&[chunk("a", vec![1.0, 0.0])])
            .unwrap();
        let merged = index
            .merge(&[chunk("b", vec![0.0, 1.0]), chunk("c", vec![1.0, 1.0])])
            .unwrap();

        assert_eq!(merged.len(), 3);
        assert_eq!(merged.text(0).unwrap(), "text for a");
        assert_eq!(merged.text(2).unwrap(), "text for c");
        assert_eq!(merged.metadata(1).unwrap().preview, "preview for b");
        // original snapshot untouched
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn merge_rejects_dimension_mismatch_without_partial_effects() {
        let index = EmbeddingIndex::empty()
            .merge(&[chunk("a", vec![1.0, 0.0])])
            .unwrap();

        let err = index
            .merge(&[chunk("ok", vec![0.0, 1.0]), chunk("bad", vec![1.0])])
            .unwrap_err();
        assert!(matches!(
            err,
            IndexError::DimensionMismatch {
                expected: 2,
                got: 1,
                ..
            }
        ));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn merge_into_empty_index_checks_against_first_chunk() {
        let err = EmbeddingIndex::empty()
            .merge(&[chunk("a", vec![1.0, 0.0]), chunk("b", vec![1.0, 0.0, 0.0])])
            .unwrap_err();
        assert!(matches!(err, IndexError::DimensionMismatch { .. }));
    }

    proptest! {
        #[test]
        fn cosine_self_similarity_is_one(v in proptest::collection::vec(-100.0f32..100.0, 1..16)) {
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            prop_assume!(norm > 1e-3);
            let sim = cosine_similarity(&v, &v);
            prop_assert!((sim - 1.0).abs() < 1e-4);
        }

        #[test]
        fn search_results_are_sorted_non_increasing(
            vectors in proptest::collection::vec(
                proptest::collection::vec(-10.0f32..10.0, 4),
                1..12,
            ),
            query in proptest::collection::vec(-10.0f32..10.0, 4),
        ) {
            let chunks: Vec<Chunk> = vectors
                .into_iter()
                .enumerate()
                .map(|(i, v)| chunk(&format!("c{i}"), v))
                .collect();
            let index = EmbeddingIndex::empty().merge(&chunks).unwrap();

            let results = index.search(&query, chunks.len());
            for pair in results.windows(2) {
                prop_assert!(pair[0].1 >= pair[1].1);
            }
        }
    }
}
