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

//! Class and predicate vocabulary for query synthesis.
//!
//! The vocabulary maps surface keywords to ontology URIs. It is read-only
//! configuration loaded once at startup and passed by reference into the
//! parser and builder. Entries are stored as ordered lists, not hash maps:
//! extraction order in [`crate::ParsedQuestion`] is defined as vocabulary
//! iteration order, so iteration must be deterministic.
//!
//! Invariant: every keyword is a lowercase, whitespace-normalized phrase.
//! Lookups are exact after the same normalization; there is no stemming.

use serde::{Deserialize, Serialize};

/// One keyword → URI mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabEntry {
    pub keyword: String,
    pub uri: String,
}

/// Process-wide keyword vocabulary for classes and predicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    /// Ontology namespace bound by the query prefix header
    pub namespace: String,

    /// Keyword → class URI, in match-priority order
    classes: Vec<VocabEntry>,

    /// Keyword → predicate URI, in match-priority order
    predicates: Vec<VocabEntry>,
}

/// Collapse internal whitespace, trim, lowercase.
pub fn normalize_keyword(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

impl Vocabulary {
    /// Build a vocabulary, normalizing every keyword on the way in.
    pub fn new(
        namespace: impl Into<String>,
        classes: Vec<VocabEntry>,
        predicates: Vec<VocabEntry>,
    ) -> Self {
        let normalize = |entries: Vec<VocabEntry>| {
            entries
                .into_iter()
                .map(|e| VocabEntry {
                    keyword: normalize_keyword(&e.keyword),
                    uri: e.uri,
                })
                .collect()
        };

        Self {
            namespace: namespace.into(),
            classes: normalize(classes),
            predicates: normalize(predicates),
        }
    }

    /// Class entries in iteration order.
    pub fn classes(&self) -> &[VocabEntry] {
        &self.classes
    }

    /// Predicate entries in iteration order.
    pub fn predicates(&self) -> &[VocabEntry] {
        &self.predicates
    }

    /// Resolve a class keyword to its URI (exact match after normalization).
    pub fn class_uri(&self, keyword: &str) -> Option<&str> {
        let key = normalize_keyword(keyword);
        self.classes
            .iter()
            .find(|e| e.keyword == key)
            .map(|e| e.uri.as_str())
    }

    /// Resolve a predicate keyword to its URI.
    pub fn predicate_uri(&self, keyword: &str) -> Option<&str> {
        let key = normalize_keyword(keyword);
        self.predicates
            .iter()
            .find(|e| e.keyword == key)
            .map(|e| e.uri.as_str())
    }

    /// Fully-qualified URI for a local name under this namespace.
    pub fn term(&self, local: &str) -> String {
        format!("<{}{}>", self.namespace, local)
    }

    /// Re-apply keyword normalization. Deserialization does not go through
    /// [`Vocabulary::new`], so configuration loaders call this once after
    /// decoding to restore the lowercase/whitespace invariant.
    pub fn normalized(self) -> Self {
        Self::new(self.namespace, self.classes, self.predicates)
    }
}

fn entry(keyword: &str, uri: String) -> VocabEntry {
    VocabEntry {
        keyword: keyword.to_string(),
        uri,
    }
}

impl Default for Vocabulary {
    /// The organization knowledge-graph vocabulary shipped with the service.
    fn default() -> Self {
        let ns = "http://example.org/ontology/";
        let term = |local: &str| format!("<{}{}>", ns, local);

        Self::new(
            ns,
            vec![
                entry("sản phẩm", term("Product")),
                entry("nhân sự", term("Person")),
                entry("công ty", term("Organization")),
            ],
            vec![
                entry("bảo hành", term("hasWarranty")),
                entry("giá", term("hasPrice")),
                entry("tính năng", term("hasFeature")),
                entry("được sản xuất bởi", term("manufacturedBy")),
                entry("nhà cung cấp", term("supplier")),
                entry("mã", term("code")),
                entry("loại", term("type")),
            ],
        )
    }
}
