//! HTTP query endpoint.
//!
//! Exposes the chatbot over a small JSON API. Only strings cross this
//! boundary: a question comes in, an answer goes out. Input rejection
//! (empty question → 400) happens here, never inside the pipeline.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/chat` | Answer a question |
//! | `GET`  | `/api/info` | Store and generator diagnostics |
//! | `GET`  | `/api/characters` | Character titles from the entity index |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "question must not be empty" } }
//! ```
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support
//! browser-based clients.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use lorekeeper_core::store::DocumentStore;

use crate::chat::Chatbot;
use crate::config::Config;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    chatbot: Arc<Chatbot>,
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    #[serde(default)]
    question: String,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    question: String,
    response: String,
}

/// Start the HTTP server on the configured bind address.
///
/// Runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let chatbot = Chatbot::from_config(config).await?;
    run_server_with_chatbot(config, Arc::new(chatbot)).await
}

/// Start the HTTP server with an already-constructed chatbot.
pub async fn run_server_with_chatbot(
    config: &Config,
    chatbot: Arc<Chatbot>,
) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let state = AppState { chatbot };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/api/chat", post(handle_chat))
        .route("/api/info", get(handle_info))
        .route("/api/characters", get(handle_characters))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state);

    println!("Server listening on http://{bind_addr}");

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn handle_chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Response {
    let question = req.question.trim().to_string();
    if question.is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "bad_request",
            "question must not be empty",
        );
    }

    let answer = state.chatbot.process_question(&question).await;
    Json(ChatResponse {
        question,
        response: answer.response,
    })
    .into_response()
}

async fn handle_info(State(state): State<AppState>) -> Response {
    let total_documents = match state.chatbot.store().count().await {
        Ok(count) => count,
        Err(err) => {
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal", &err.to_string())
        }
    };

    let entities = state.chatbot.entities();
    let (provider, model) = state.chatbot.generator_info();

    Json(serde_json::json!({
        "stats": {
            "total_documents": total_documents,
            "characters": entities.characters.len(),
            "houses": entities.houses.len(),
            "locations": entities.locations.len(),
            "generator_provider": provider,
            "generator_model": model,
        },
        "sample_characters": entities.characters.iter().take(10).collect::<Vec<_>>(),
    }))
    .into_response()
}

async fn handle_characters(State(state): State<AppState>) -> Response {
    Json(serde_json::json!({
        "characters": state.chatbot.entities().characters,
    }))
    .into_response()
}

async fn handle_health() -> Response {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
    .into_response()
}

fn error_response(status: StatusCode, code: &str, message: &str) -> Response {
    (
        status,
        Json(serde_json::json!({
            "error": { "code": code, "message": message }
        })),
    )
        .into_response()
}
