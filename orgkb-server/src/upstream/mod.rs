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

//! HTTP clients for the three upstream services: the embedding model, the
//! SPARQL store, and the generation model. Each client maps transport
//! failures onto [`orgkb_core::RetrievalError`] with its stage named.

pub mod embedding;
pub mod generation;
pub mod store;

pub use embedding::HttpEmbedder;
pub use generation::{ModelEntityRecognizer, OllamaGenerator};
pub use store::SparqlStore;
