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

/// Coarse question type driving the shape of the synthesized query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Look up matching subjects
    Find,
    /// Aggregate count of matching subjects
    Count,
    /// Yes/no interrogative
    YesNo,
}

/// A recognized mention and its coarse type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Mention text, original casing
    pub text: String,
    /// Coarse label (e.g. "ORG")
    pub label: String,
}

/// One derived constraint: attribute, operator, value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub attribute: String,
    pub operator: String,
    pub value: String,
}

impl Filter {
    pub fn eq(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            operator: "=".to_string(),
            value: value.into(),
        }
    }
}

/// Structured record extracted from one natural-language question.
///
/// Created once per question by the parser, consumed once by the query
/// builder, never persisted. `classes`, `attributes` and `filters` keep
/// their extraction order; duplicates in `classes`/`attributes` are
/// impossible because each vocabulary key is tested exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedQuestion {
    /// Original question text, casing preserved
    pub raw: String,

    /// Classified intent
    pub intent: Intent,

    /// Recognized class keywords, in vocabulary order
    pub classes: Vec<String>,

    /// Recognized attribute keywords, in vocabulary order
    pub attributes: Vec<String>,

    /// Entities recognized in the original (non-lowercased) text
    pub entities: Vec<Entity>,

    /// Derived constraints, numeric/unit filters before entity filters
    pub filters: Vec<Filter>,
}

/// Which retrieval path produced the context block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextSource {
    /// Vector similarity cleared the threshold
    Vector,
    /// Structured-store fallback returned a binding
    Structured,
    /// Neither path yielded content; context is empty
    None,
}

/// Per-request retrieval outcome handed to the prompt assembler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub context_text: String,
    pub source: ContextSource,
}

impl RetrievalResult {
    pub fn none() -> Self {
        Self {
            context_text: String::new(),
            source: ContextSource::None,
        }
    }
}
