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

pub mod api;
pub mod config;
pub mod upstream;

use anyhow::Result;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use api::{ask, ask_stream, health_check, upload, AppState, IndexHandle};
use config::ServerConfig;
use orgkb_index::EmbeddingIndex;
use orgkb_prompts::PromptAssembler;
use orgkb_query::{
    EntityRecognizer, KeywordRecognizer, QueryBuilder, QuestionParser, RetrievalRouter,
};
use upstream::{HttpEmbedder, ModelEntityRecognizer, OllamaGenerator, SparqlStore};

pub async fn run_server(config: ServerConfig) -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "orgkb_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting OrgKB Server");
    config.validate()?;

    // Load the persisted embedding index (an absent file starts empty)
    let index_path = config.index_path();
    let index = EmbeddingIndex::load(&index_path)?;
    tracing::info!(
        path = %index_path.display(),
        chunks = index.len(),
        "embedding index loaded"
    );
    let index = Arc::new(IndexHandle::new(index));

    // Upstream clients
    let request_timeout = Duration::from_secs(config.upstream.request_timeout_secs);
    let generation_timeout = Duration::from_secs(config.upstream.generation_timeout_secs);

    let embedder = Arc::new(HttpEmbedder::new(
        &config.upstream.model_base_url,
        config.upstream.embedding_model.clone(),
        request_timeout,
    )?);
    let store = Arc::new(SparqlStore::new(
        config.upstream.store_url.clone(),
        request_timeout,
    )?);
    let generator = Arc::new(OllamaGenerator::new(
        &config.upstream.model_base_url,
        config.upstream.generation_model.clone(),
        generation_timeout,
    )?);

    // Entity recognition: model-backed extraction or the configured
    // keyword list, behind one trait either way.
    let recognizer: Arc<dyn EntityRecognizer> = if config.retrieval.model_entity_recognizer {
        tracing::info!("Using model-backed entity recognizer");
        Arc::new(ModelEntityRecognizer::new(generator.clone()))
    } else {
        tracing::info!(
            names = config.retrieval.known_organizations.len(),
            "Using keyword entity recognizer"
        );
        Arc::new(KeywordRecognizer::new(
            config.retrieval.known_organizations.clone(),
        ))
    };

    let vocabulary = Arc::new(config.vocabulary.clone());
    let parser = Arc::new(QuestionParser::new(&vocabulary, recognizer.clone())?);
    let builder = QueryBuilder::new(vocabulary);

    let router = Arc::new(RetrievalRouter::new(
        embedder.clone(),
        store.clone(),
        recognizer,
        builder.clone(),
        &config.router_config(),
    )?);

    let state = AppState {
        index,
        index_path,
        parser,
        builder,
        router,
        embedder,
        store,
        generator,
        assembler: PromptAssembler::new(),
    };

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/ask", post(ask))
        .route("/ask_stream", get(ask_stream))
        .route("/upload", post(upload))
        .with_state(state)
        .layer(if config.server.enable_cors {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            CorsLayer::new()
        })
        .layer(TraceLayer::new_for_http());

    let addr = config.socket_addr()?;
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
