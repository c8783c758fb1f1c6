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

//! Core types shared across the OrgKB workspace.
//!
//! This crate defines the data model of the hybrid retrieval pipeline:
//! embedded document chunks, parsed question records, the class/predicate
//! vocabulary the query compiler resolves against, and the error taxonomy
//! used at the network boundaries.

pub mod chunk;
pub mod error;
pub mod question;
pub mod vocabulary;

pub use chunk::{Chunk, ChunkMetadata};
pub use error::{RetrievalError, UpstreamStage};
pub use question::{ContextSource, Entity, Filter, Intent, ParsedQuestion, RetrievalResult};
pub use vocabulary::{VocabEntry, Vocabulary};
