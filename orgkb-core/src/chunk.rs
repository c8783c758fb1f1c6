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

use serde::{Deserialize, Serialize};

/// Descriptive metadata attached to one embedded chunk.
///
/// The `preview` is the context block handed to the generation service when
/// the vector path wins, so it must be short but self-contained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Originating document (filename or logical source identifier)
    pub source: String,

    /// Zero-based section index within the source document
    pub section_id: usize,

    /// Heading the section was split on
    pub section_title: String,

    /// First part of the section body, used as retrieval context
    pub preview: String,
}

/// One unit of source text with its embedding vector and metadata.
///
/// Chunks are immutable once stored in an index; updates append new chunks,
/// they never rewrite existing ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Opaque identifier (source plus section index by convention)
    pub id: String,

    /// Full text that was embedded
    pub text: String,

    /// Embedding vector; dimensionality is fixed per model
    pub vector: Vec<f32>,

    /// Descriptive metadata
    pub metadata: ChunkMetadata,
}

impl Chunk {
    pub fn dimension(&self) -> usize {
        self.vector.len()
    }
}
