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

use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures::Stream;
use orgkb_core::ParsedQuestion;
use orgkb_query::{BindingRow, StructuredStore};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::convert::Infallible;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;

use crate::api::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AskResponse {
    pub parsed: ParsedQuestion,
    pub query: String,
    pub store_results: Vec<BindingRow>,
    pub answer: String,
}

/// POST /ask
///
/// Runs the full structured pipeline (parse, synthesize, execute, answer)
/// and returns every intermediate artifact alongside the answer.
pub async fn ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    let question = request.question.trim();
    if question.is_empty() {
        return Err(ApiError::BadRequest("question cannot be empty".into()));
    }

    let parsed = state.parser.parse(question).await;
    let query = state.builder.build(&parsed);

    let rows = state.store.select(&query).await?;

    let context = serde_json::to_string(&rows)
        .map_err(|e| ApiError::Internal(format!("failed to encode bindings: {}", e)))?;
    let prompt = state
        .assembler
        .assemble(&context, question)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let answer = state.generator.generate(&prompt).await?;

    Ok(Json(AskResponse {
        parsed,
        query,
        store_results: rows,
        answer,
    }))
}

#[derive(Debug, Deserialize)]
pub struct AskStreamParams {
    pub question: String,
}

/// GET /ask_stream?question=...
///
/// Retrieves context through the hybrid router, then streams the generated
/// answer as SSE events, one `{"token": ...}` payload per model fragment.
pub async fn ask_stream(
    State(state): State<AppState>,
    Query(params): Query<AskStreamParams>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let question = params.question.trim().to_string();

    let snapshot = state.index.current();
    let retrieval = state.router.retrieve(&snapshot, &question).await?;
    tracing::debug!(source = ?retrieval.source, "context retrieved");

    let prompt = state
        .assembler
        .assemble(&retrieval.context_text, &question)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let rx = state.generator.stream(&prompt).await?;
    let stream = ReceiverStream::new(rx).map(|token| {
        Ok(Event::default().data(json!({ "token": token }).to_string()))
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use orgkb_core::Intent;

    #[test]
    fn response_uses_camel_case_wire_names() {
        let response = AskResponse {
            parsed: ParsedQuestion {
                raw: "q".to_string(),
                intent: Intent::Find,
                classes: vec![],
                attributes: vec![],
                entities: vec![],
                filters: vec![],
            },
            query: "SELECT".to_string(),
            store_results: vec![],
            answer: "a".to_string(),
        };

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("storeResults").is_some());
        assert!(json.get("store_results").is_none());
    }

    #[test]
    fn token_events_wrap_json_payloads() {
        let payload = json!({ "token": "xin " }).to_string();
        assert_eq!(payload, r#"{"token":"xin "}"#);
    }
}
