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

//! Question parsing, query synthesis, and retrieval routing.
//!
//! The parser turns a natural-language question into a structured
//! [`orgkb_core::ParsedQuestion`]; the builder deterministically compiles
//! that record into a SPARQL string; the router decides per request whether
//! a vector match is trustworthy or the structured fallback should run.

pub mod builder;
pub mod parser;
pub mod recognizer;
pub mod router;

pub use builder::QueryBuilder;
pub use parser::QuestionParser;
pub use recognizer::{EntityRecognizer, KeywordRecognizer};
pub use router::{
    BindingRow, Embedder, RetrievalRouter, RouterConfig, StructuredStore,
};
