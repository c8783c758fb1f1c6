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

use async_trait::async_trait;
use orgkb_core::{RetrievalError, UpstreamStage};
use orgkb_query::{BindingRow, StructuredStore};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// SPARQL JSON results, as returned by Fuseki-style endpoints.
#[derive(Deserialize)]
struct SelectResponse {
    results: SelectResults,
}

#[derive(Deserialize)]
struct SelectResults {
    bindings: Vec<HashMap<String, BoundValue>>,
}

#[derive(Deserialize)]
struct BoundValue {
    value: String,
}

/// Flatten SPARQL JSON bindings to plain `variable -> value` rows.
fn flatten_bindings(response: SelectResponse) -> Vec<BindingRow> {
    response
        .results
        .bindings
        .into_iter()
        .map(|row| row.into_iter().map(|(var, v)| (var, v.value)).collect())
        .collect()
}

/// Client for a triple store exposing a SPARQL SELECT endpoint over HTTP.
pub struct SparqlStore {
    client: reqwest::Client,
    endpoint: String,
}

impl SparqlStore {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl StructuredStore for SparqlStore {
    async fn select(&self, query: &str) -> Result<Vec<BindingRow>, RetrievalError> {
        tracing::debug!(%query, "executing select");

        let response = self
            .client
            .post(&self.endpoint)
            .header("Accept", "application/sparql-results+json")
            .form(&[("query", query)])
            .send()
            .await
            .map_err(|e| {
                RetrievalError::upstream(UpstreamStage::StructuredStore, e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RetrievalError::upstream(
                UpstreamStage::StructuredStore,
                format!("status {}", status),
            ));
        }

        let body: SelectResponse = response.json().await.map_err(|e| {
            RetrievalError::decode(UpstreamStage::StructuredStore, e.to_string())
        })?;

        Ok(flatten_bindings(body))
    }
}
