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

//! SPARQL synthesis from a parsed question.
//!
//! [`QueryBuilder::build`] is a total function: any [`ParsedQuestion`]
//! yields a syntactically valid query. Unresolvable vocabulary keywords are
//! skipped rather than erroring, so a sparse parse degrades into a broad
//! query instead of a failure.

use orgkb_core::{Intent, ParsedQuestion, Vocabulary};
use std::collections::HashSet;
use std::sync::Arc;

const RDFS_PREFIX: &str = "PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>";

#[derive(Clone)]
pub struct QueryBuilder {
    vocabulary: Arc<Vocabulary>,
}

/// Render a filter value as a SPARQL object term. Bare integers stay
/// unquoted so numeric predicates compare numerically; everything else
/// becomes an escaped string literal.
fn literal(value: &str) -> String {
    if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
        value.to_string()
    } else {
        format!(
            "\"{}\"",
            value.replace('\\', "\\\\").replace('"', "\\\"")
        )
    }
}

/// Variable-safe form of an attribute keyword ("bảo hành" -> "bảo_hành").
fn sanitize_var(keyword: &str) -> String {
    keyword
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

impl QueryBuilder {
    pub fn new(vocabulary: Arc<Vocabulary>) -> Self {
        Self { vocabulary }
    }

    fn prefixes(&self) -> String {
        format!(
            "PREFIX ex: <{}>\n{}\n",
            self.vocabulary.namespace, RDFS_PREFIX
        )
    }

    /// Synthesize the query for one parsed question.
    pub fn build(&self, parsed: &ParsedQuestion) -> String {
        let mut body: Vec<String> = Vec::new();

        // Only the first recognized class constrains the subject type.
        if let Some(uri) = parsed
            .classes
            .first()
            .and_then(|c| self.vocabulary.class_uri(c))
        {
            body.push(format!("  ?s a {} .", uri));
        }

        // Filters with a resolvable predicate become mandatory triples.
        let mut constrained: HashSet<&str> = HashSet::new();
        for filter in &parsed.filters {
            if let Some(uri) = self.vocabulary.predicate_uri(&filter.attribute) {
                body.push(format!("  ?s {} {} .", uri, literal(&filter.value)));
                constrained.insert(filter.attribute.as_str());
            }
        }

        // Remaining attributes are projected optionally so their absence
        // never suppresses a subject.
        for attr in &parsed.attributes {
            if constrained.contains(attr.as_str()) {
                continue;
            }
            if let Some(uri) = self.vocabulary.predicate_uri(attr) {
                body.push(format!(
                    "  OPTIONAL {{ ?s {} ?attr_{} . }}",
                    uri,
                    sanitize_var(attr)
                ));
            }
        }

        body.push("  OPTIONAL { ?s rdfs:label ?sLabel . }".to_string());
        let body = body.join("\n");

        match parsed.intent {
            Intent::Count => format!(
                "{}SELECT (COUNT(DISTINCT ?s) AS ?count) WHERE {{\n{}\n}}",
                self.prefixes(),
                body
            ),
            Intent::Find | Intent::YesNo => format!(
                "{}SELECT DISTINCT ?s ?sLabel WHERE {{\n{}\n}}\nLIMIT 10",
                self.prefixes(),
                body
            ),
        }
    }

    /// Fixed-shape lookup of one organization by (partial, case-insensitive)
    /// name. Used by the structured fallback path, not by question parsing.
    pub fn lookup_by_name(&self, name: &str) -> String {
        let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
        format!(
            "{}SELECT ?name ?type ?address ?business ?registered WHERE {{\n\
             \x20 ?s a ex:Organization .\n\
             \x20 ?s ex:name ?name .\n\
             \x20 OPTIONAL {{ ?s ex:type ?type . }}\n\
             \x20 OPTIONAL {{ ?s ex:address ?address . }}\n\
             \x20 OPTIONAL {{ ?s ex:business ?business . }}\n\
             \x20 OPTIONAL {{ ?s ex:latestLegalRegistration ?registered . }}\n\
             \x20 FILTER(CONTAINS(LCASE(?name), LCASE(\"{}\")))\n\
             }}\nLIMIT 1",
            self.prefixes(),
            escaped
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orgkb_core::{Filter, Intent};

    fn builder() -> QueryBuilder {
        QueryBuilder::new(Arc::new(Vocabulary::default()))
    }

    fn parsed(intent: Intent) -> ParsedQuestion {
        ParsedQuestion {
            raw: String::new(),
            intent,
            classes: vec![],
            attributes: vec![],
            entities: vec![],
            filters: vec![],
        }
    }

    #[test]
    fn bare_integer_values_stay_unquoted() {
        assert_eq!(literal("5"), "5");
        assert_eq!(literal("5 tháng"), "\"5 tháng\"");
    }

    #[test]
    fn string_literals_escape_quotes() {
        assert_eq!(literal(r#"say "hi""#), r#""say \"hi\"""#);
    }

    #[test]
    fn count_intent_selects_distinct_count() {
        let mut p = parsed(Intent::Count);
        p.classes.push("sản phẩm".to_string());
        let query = builder().build(&p);

        assert!(query.contains("SELECT (COUNT(DISTINCT ?s) AS ?count) WHERE {"));
        assert!(query.contains("?s a <http://example.org/ontology/Product> ."));
        assert!(!query.contains("LIMIT 10"));
    }

    #[test]
    fn find_intent_selects_subjects_with_limit() {
        let mut p = parsed(Intent::Find);
        p.classes.push("sản phẩm".to_string());
        let query = builder().build(&p);

        assert!(query.starts_with("PREFIX ex: <http://example.org/ontology/>\n"));
        assert!(query.contains("SELECT DISTINCT ?s ?sLabel WHERE {"));
        assert!(query.ends_with("LIMIT 10"));
    }

    #[test]
    fn only_first_class_constrains_type() {
        let mut p = parsed(Intent::Find);
        p.classes = vec!["sản phẩm".to_string(), "công ty".to_string()];
        let query = builder().build(&p);

        assert!(query.contains("<http://example.org/ontology/Product>"));
        assert!(!query.contains("<http://example.org/ontology/Organization>"));
    }

    #[test]
    fn resolvable_filter_becomes_mandatory_triple() {
        let mut p = parsed(Intent::Find);
        p.attributes.push("bảo hành".to_string());
        p.filters.push(Filter::eq("bảo hành", "12 tháng"));
        let query = builder().build(&p);

        assert!(query
            .contains("?s <http://example.org/ontology/hasWarranty> \"12 tháng\" ."));
        // The attribute is already constrained, so no OPTIONAL projection.
        assert!(!query.contains("?attr_bảo_hành"));
    }

    #[test]
    fn unconstrained_attribute_becomes_optional() {
        let mut p = parsed(Intent::Find);
        p.attributes.push("giá".to_string());
        let query = builder().build(&p);

        assert!(query.contains(
            "OPTIONAL { ?s <http://example.org/ontology/hasPrice> ?attr_giá . }"
        ));
    }

    #[test]
    fn unresolvable_keywords_are_skipped() {
        let mut p = parsed(Intent::Find);
        p.filters.push(Filter::eq("ORG", "Nestlé"));
        p.attributes.push("unknown attr".to_string());
        let query = builder().build(&p);

        assert!(!query.contains("Nestlé"));
        assert!(!query.contains("unknown"));
    }

    #[test]
    fn empty_parse_still_builds_valid_query() {
        let query = builder().build(&parsed(Intent::Find));

        assert!(query.contains("SELECT DISTINCT ?s ?sLabel WHERE {"));
        assert!(query.contains("OPTIONAL { ?s rdfs:label ?sLabel . }"));
    }

    #[test]
    fn label_projection_is_always_present() {
        let mut p = parsed(Intent::Count);
        p.classes.push("công ty".to_string());
        let query = builder().build(&p);
        assert!(query.contains("OPTIONAL { ?s rdfs:label ?sLabel . }"));
    }

    #[test]
    fn lookup_by_name_is_case_insensitive_contains() {
        let query = builder().lookup_by_name("Nestlé");

        assert!(query.contains("?s a ex:Organization ."));
        assert!(query.contains("FILTER(CONTAINS(LCASE(?name), LCASE(\"Nestlé\")))"));
        assert!(query.ends_with("LIMIT 1"));
    }

    #[test]
    fn lookup_by_name_escapes_quotes() {
        let query = builder().lookup_by_name("A \"B\" Corp");
        assert!(query.contains("LCASE(\"A \\\"B\\\" Corp\")"));
    }
}
