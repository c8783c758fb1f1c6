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

//! Natural-language question parser.
//!
//! Parsing is a fixed sequence of steps over the normalized question text:
//! intent classification, vocabulary keyword extraction, number/unit
//! extraction, then entity recognition on the original casing. Intent rules
//! are an explicit ordered list with first-match-wins semantics; the
//! ordering (quantity before yes/no before the find fallback) is a tested
//! contract, not an accident of statement order.

use crate::recognizer::EntityRecognizer;
use orgkb_core::vocabulary::normalize_keyword;
use orgkb_core::{Filter, Intent, ParsedQuestion, Vocabulary};
use regex::Regex;
use std::sync::Arc;

/// Unit tokens recognized after an integer. Longer tokens come first so the
/// alternation prefers them ("đồng" over "đ").
const UNIT_TOKENS: &[&str] = &["tháng", "năm", "ngày", "vnd", "đồng", "đ", "%"];

struct IntentRule {
    name: &'static str,
    pattern: Regex,
    intent: Intent,
}

/// Stateless parser over `(question, vocabulary, entity recognizer)`.
///
/// Deterministic: identical input and vocabulary produce an identical
/// [`ParsedQuestion`] on every call.
pub struct QuestionParser {
    recognizer: Arc<dyn EntityRecognizer>,
    intent_rules: Vec<IntentRule>,
    class_patterns: Vec<(Regex, String)>,
    predicate_patterns: Vec<(Regex, String)>,
    number_unit: Regex,
}

impl QuestionParser {
    pub fn new(
        vocabulary: &Vocabulary,
        recognizer: Arc<dyn EntityRecognizer>,
    ) -> Result<Self, regex::Error> {
        // Ordered intent rules, first match wins: count beats yesno beats find.
        let intent_rules = vec![
            IntentRule {
                name: "quantity",
                pattern: Regex::new(r"\b(bao nhiêu|số lượng|count|có bao nhiêu)\b")?,
                intent: Intent::Count,
            },
            IntentRule {
                name: "yesno",
                pattern: Regex::new(r"\b(có|liệu)\b.*(\bkhông\b|\bko\b|\?)")?,
                intent: Intent::YesNo,
            },
        ];

        let whole_word = |keyword: &str| -> Result<Regex, regex::Error> {
            Regex::new(&format!(r"\b{}\b", regex::escape(keyword)))
        };

        let mut class_patterns = Vec::with_capacity(vocabulary.classes().len());
        for entry in vocabulary.classes() {
            class_patterns.push((whole_word(&entry.keyword)?, entry.keyword.clone()));
        }

        let mut predicate_patterns = Vec::with_capacity(vocabulary.predicates().len());
        for entry in vocabulary.predicates() {
            predicate_patterns.push((whole_word(&entry.keyword)?, entry.keyword.clone()));
        }

        // Matched against the normalized (lowercased) question.
        let number_unit = Regex::new(&format!(r"(\d+)\s*({})?", UNIT_TOKENS.join("|")))?;

        Ok(Self {
            recognizer,
            intent_rules,
            class_patterns,
            predicate_patterns,
            number_unit,
        })
    }

    /// Parse one question into its structured record.
    pub async fn parse(&self, question: &str) -> ParsedQuestion {
        let normalized = normalize_keyword(question);

        let intent = self.classify_intent(&normalized);

        let classes: Vec<String> = self
            .class_patterns
            .iter()
            .filter(|(pattern, _)| pattern.is_match(&normalized))
            .map(|(_, keyword)| keyword.clone())
            .collect();

        let attributes: Vec<String> = self
            .predicate_patterns
            .iter()
            .filter(|(pattern, _)| pattern.is_match(&normalized))
            .map(|(_, keyword)| keyword.clone())
            .collect();

        let mut filters = Vec::new();
        if let Some(value) = self.find_number_and_unit(&normalized) {
            if attributes.is_empty() {
                filters.push(Filter::eq("value", value));
            } else {
                for attr in &attributes {
                    filters.push(Filter::eq(attr.clone(), value.clone()));
                }
            }
        }

        // Entities are recognized against the original casing.
        let entities = self.recognizer.extract(question).await;
        for entity in &entities {
            filters.push(Filter::eq(entity.label.clone(), entity.text.clone()));
        }

        ParsedQuestion {
            raw: question.to_string(),
            intent,
            classes,
            attributes,
            entities,
            filters,
        }
    }

    fn classify_intent(&self, normalized: &str) -> Intent {
        for rule in &self.intent_rules {
            if rule.pattern.is_match(normalized) {
                tracing::trace!(rule = rule.name, "intent rule matched");
                return rule.intent;
            }
        }
        Intent::Find
    }

    /// First `<integer><optional unit>` occurrence, rendered as
    /// `"<number> <unit>"` (unit omitted when absent).
    fn find_number_and_unit(&self, text: &str) -> Option<String> {
        let caps = self.number_unit.captures(text)?;
        let number = caps.get(1)?.as_str();
        match caps.get(2) {
            Some(unit) => Some(format!("{} {}", number, unit.as_str())),
            None => Some(number.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognizer::KeywordRecognizer;
    use orgkb_core::Entity;

    fn parser_with(names: &[&str]) -> QuestionParser {
        let vocabulary = Vocabulary::default();
        let recognizer = Arc::new(KeywordRecognizer::new(
            names.iter().map(|s| s.to_string()).collect(),
        ));
        QuestionParser::new(&vocabulary, recognizer).unwrap()
    }

    #[tokio::test]
    async fn quantity_cue_beats_yesno_cue() {
        // Contains both a quantity cue and a yes/no cue; count must win.
        let parser = parser_with(&[]);
        let parsed = parser.parse("Có bao nhiêu sản phẩm có giá?").await;
        assert_eq!(parsed.intent, Intent::Count);
    }

    #[tokio::test]
    async fn yesno_interrogative_classifies() {
        let parser = parser_with(&[]);
        let parsed = parser.parse("Sản phẩm này có bảo hành không?").await;
        assert_eq!(parsed.intent, Intent::YesNo);
    }

    #[tokio::test]
    async fn unmatched_question_falls_back_to_find() {
        let parser = parser_with(&[]);
        let parsed = parser.parse("Giá của sản phẩm A").await;
        assert_eq!(parsed.intent, Intent::Find);
    }

    #[tokio::test]
    async fn vocabulary_keywords_extract_in_map_order() {
        let parser = parser_with(&[]);
        let parsed = parser
            .parse("giá và bảo hành của sản phẩm do nhà cung cấp đưa ra")
            .await;

        assert_eq!(parsed.classes, vec!["sản phẩm"]);
        // Extraction order is vocabulary order, not textual order.
        assert_eq!(parsed.attributes, vec!["bảo hành", "giá", "nhà cung cấp"]);
    }

    #[tokio::test]
    async fn keyword_matching_is_whole_word() {
        let parser = parser_with(&[]);
        // "giảm" must not match the "giá" keyword.
        let parsed = parser.parse("giảm mạnh trong quý ba").await;
        assert!(parsed.attributes.is_empty());
    }

    #[tokio::test]
    async fn number_with_unit_becomes_filter_per_attribute() {
        let parser = parser_with(&[]);
        let parsed = parser.parse("sản phẩm bảo hành 12 tháng").await;

        assert_eq!(
            parsed.filters,
            vec![Filter::eq("bảo hành", "12 tháng")]
        );
    }

    #[tokio::test]
    async fn number_without_attribute_becomes_generic_filter() {
        let parser = parser_with(&[]);
        let parsed = parser.parse("những mặt hàng trên 500 vnd").await;
        assert_eq!(parsed.filters, vec![Filter::eq("value", "500 vnd")]);
    }

    #[tokio::test]
    async fn unit_alternation_prefers_the_longer_token() {
        let parser = parser_with(&[]);
        let parsed = parser.parse("giá 500 đồng phải không?").await;
        assert_eq!(parsed.filters, vec![Filter::eq("giá", "500 đồng")]);
    }

    #[tokio::test]
    async fn bare_number_keeps_no_unit() {
        let parser = parser_with(&[]);
        let parsed = parser.parse("mã 42 là gì").await;
        assert_eq!(parsed.filters, vec![Filter::eq("mã", "42")]);
    }

    #[tokio::test]
    async fn recognized_entities_append_filters() {
        let parser = parser_with(&["Nestlé"]);
        let parsed = parser.parse("Nestlé có bao nhiêu sản phẩm?").await;

        assert_eq!(
            parsed.entities,
            vec![Entity {
                text: "Nestlé".to_string(),
                label: "ORG".to_string(),
            }]
        );
        assert_eq!(parsed.filters, vec![Filter::eq("ORG", "Nestlé")]);
    }

    #[tokio::test]
    async fn parsing_is_deterministic() {
        let parser = parser_with(&["Nestlé"]);
        let question = "Nestlé bảo hành sản phẩm 12 tháng phải không?";
        let first = parser.parse(question).await;
        let second = parser.parse(question).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn raw_text_keeps_original_casing() {
        let parser = parser_with(&[]);
        let parsed = parser.parse("  Sản   Phẩm \t có giá KHÔNG?").await;
        assert_eq!(parsed.raw, "  Sản   Phẩm \t có giá KHÔNG?");
        assert_eq!(parsed.classes, vec!["sản phẩm"]);
    }
}
