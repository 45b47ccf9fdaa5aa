//! API routes for the case Q&A server

pub mod ask;
pub mod document;
pub mod upload;

use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
    Json, Router,
};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Upload replaces the active document
        .route(
            "/upload",
            post(upload::upload_case).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/ask", post(ask::ask_question))
        .route("/document", get(document::active_document))
        .route("/info", get(info))
}

/// API info endpoint
async fn info(State(state): State<AppState>) -> Json<serde_json::Value> {
    let engine = state.engine();
    Json(serde_json::json!({
        "name": "case-rag",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Question answering over uploaded business case PDFs",
        "embeddings": {
            "provider": engine.embedder().name(),
            "model": engine.embedder().model(),
            "dimensions": engine.embedder().dimensions(),
        },
        "generation": {
            "provider": engine.llm().name(),
            "model": engine.llm().model(),
        },
        "retrieval": {
            "store": engine.store().name(),
            "top_k": engine.top_k(),
        },
        "endpoints": {
            "POST /api/upload": "Upload a case PDF (multipart field `file`) and index it",
            "POST /api/ask": "Ask a question about the active case",
            "GET /api/document": "Describe the active case",
            "GET /api/info": "Service information"
        }
    }))
}
