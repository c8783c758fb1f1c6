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

//! Entity recognition seam.
//!
//! The parser and router only see the [`EntityRecognizer`] trait; the
//! backing implementation is picked at startup. [`KeywordRecognizer`]
//! matches against a fixed name list and is the zero-dependency default;
//! the server crate provides a model-backed implementation behind the same
//! trait.

use async_trait::async_trait;
use orgkb_core::Entity;

/// Extracts named entities from question text.
///
/// Implementations must be infallible: recognition trouble is reported as
/// an empty list, never as an error, so a flaky recognizer degrades the
/// parse instead of failing the request.
#[async_trait]
pub trait EntityRecognizer: Send + Sync {
    async fn extract(&self, text: &str) -> Vec<Entity>;
}

/// Recognizer over a fixed list of known organization names.
///
/// Matching is case-insensitive substring; a hit yields the canonical name
/// from the list, not the span as written. Results follow list order.
pub struct KeywordRecognizer {
    names: Vec<String>,
}

impl KeywordRecognizer {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }
}

#[async_trait]
impl EntityRecognizer for KeywordRecognizer {
    async fn extract(&self, text: &str) -> Vec<Entity> {
        let haystack = text.to_lowercase();
        self.names
            .iter()
            .filter(|name| haystack.contains(&name.to_lowercase()))
            .map(|name| Entity {
                text: name.clone(),
                label: "ORG".to_string(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recognizer() -> KeywordRecognizer {
        KeywordRecognizer::new(vec![
            "Nestlé".to_string(),
            "Acme Corp".to_string(),
        ])
    }

    #[tokio::test]
    async fn match_is_case_insensitive_and_canonical() {
        let entities = recognizer().extract("thông tin về NESTLÉ?").await;
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].text, "Nestlé");
        assert_eq!(entities[0].label, "ORG");
    }

    #[tokio::test]
    async fn results_follow_list_order() {
        let entities = recognizer()
            .extract("so sánh acme corp với nestlé")
            .await;
        let names: Vec<&str> = entities.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(names, vec!["Nestlé", "Acme Corp"]);
    }

    #[tokio::test]
    async fn no_match_yields_empty_list() {
        let entities = recognizer().extract("giá sản phẩm là bao nhiêu").await;
        assert!(entities.is_empty());
    }
}
