//! HTTP question-answering server.
//!
//! Exposes the pipeline over a small JSON API:
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/ask` | Answer a question about the site |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! `POST /ask` takes `{"query": "<string>"}` and returns
//! `{"answer": "<string>"}`. A missing `query` field is treated as an empty
//! string, which triage answers with a prompt-for-detail reply. Queries that
//! match a triage category are answered locally; everything else goes
//! through retrieval and the chat provider.
//!
//! # Error Contract
//!
//! Error responses carry a machine-readable code and a message:
//!
//! ```json
//! { "error": { "code": "completion_unavailable", "message": "..." } }
//! ```
//!
//! Codes: `embedding_unavailable` (502), `completion_unavailable` (502),
//! `internal` (500). Provider failures surface to the caller — the server
//! never substitutes an ungrounded or empty answer.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser-based
//! clients.

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

use crate::answer::{self, ChatCompleter};
use crate::config::Config;
use crate::kb::KnowledgeBase;
use crate::triage::{self, TriageCategory};

/// Shared application state passed to all route handlers via Axum's `State`
/// extractor. Everything here is built once at startup and read-only after.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    kb: Arc<KnowledgeBase>,
    completer: Arc<dyn ChatCompleter>,
}

/// Starts the question-answering HTTP server.
///
/// Binds to the address configured in `[server].bind` and serves until the
/// process is terminated. The knowledge base must already be built — the
/// listener only binds once there is a grounded index to answer from.
pub async fn run_server(
    config: &Config,
    kb: Arc<KnowledgeBase>,
    completer: Arc<dyn ChatCompleter>,
) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();

    let state = AppState {
        config: Arc::new(config.clone()),
        kb,
        completer,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/ask", post(handle_ask))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state);

    println!("sitesage listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

/// Constructs a 500 error for invariant violations.
fn internal_error(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

/// Constructs a 502 error for an unreachable or misbehaving provider.
fn upstream_error(code: &str, message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_GATEWAY,
        code: code.to_string(),
        message: message.into(),
    }
}

/// Maps retrieval failures to the right error code. A dimension mismatch
/// means the query embedder differs from the corpus embedder — an invariant
/// violation, not a provider outage.
fn classify_retrieval_error(err: anyhow::Error) -> AppError {
    let msg = err.to_string();
    if msg.contains("dimension mismatch") {
        internal_error(msg)
    } else {
        upstream_error("embedding_unavailable", msg)
    }
}

// ============ GET /health ============

/// JSON response body for `GET /health`.
#[derive(Serialize)]
struct HealthResponse {
    /// Always `"ok"` when the server is running.
    status: String,
    /// The crate version from `Cargo.toml`.
    version: String,
}

/// Handler for `GET /health`.
async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /ask ============

/// JSON request body for `POST /ask`.
#[derive(Deserialize)]
struct AskRequest {
    /// The visitor's question. Missing field ⇒ empty string.
    #[serde(default)]
    query: String,
}

/// JSON response body for `POST /ask`.
#[derive(Serialize)]
struct AskResponse {
    answer: String,
}

/// Handler for `POST /ask`.
///
/// Triage runs first; a matched category returns a canned reply without
/// touching either provider. Otherwise the query is embedded, the nearest
/// chunks retrieved, and the chat provider asked for a grounded answer.
async fn handle_ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, AppError> {
    let query = request.query;

    let category = triage::classify(&query);
    if category != TriageCategory::None {
        // canned_response is Some for every category except None
        let answer = triage::canned_response(category)
            .ok_or_else(|| internal_error("no canned response for triage category"))?;
        return Ok(Json(AskResponse {
            answer: answer.to_string(),
        }));
    }

    let context = state
        .kb
        .retrieve(&query, state.config.retrieval.top_k)
        .await
        .map_err(classify_retrieval_error)?;

    let answer = answer::answer(state.completer.as_ref(), &query, &context)
        .await
        .map_err(|e| upstream_error("completion_unavailable", e.to_string()))?;

    Ok(Json(AskResponse { answer }))
}
