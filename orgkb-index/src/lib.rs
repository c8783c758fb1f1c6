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

//! Embedding index: exact cosine search over persisted document chunks.
//!
//! The index holds three parallel collections (vectors, texts, metadata)
//! that always have equal length. It is an immutable value: updates build a
//! new index via [`EmbeddingIndex::merge`] and publish it atomically, so
//! readers keep scanning their snapshot while a writer prepares the next
//! one. Search is a linear scan with exact cosine similarity, a deliberate
//! simplicity tradeoff for moderate corpus sizes; there is no ANN structure.

pub mod index;
pub mod persist;
pub mod section;

pub use index::{cosine_similarity, EmbeddingIndex, IndexError};
pub use section::{split_into_sections, Section};
