//! Question endpoint

use axum::{extract::State, Json};
use std::time::Instant;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{AskRequest, AskResponse};

/// POST /api/ask - Answer a question about the active case
pub async fn ask_question(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>> {
    let start = Instant::now();

    let question = request.normalized().ok_or(Error::EmptyQuestion)?;
    let active = state
        .active()
        .ok_or_else(|| Error::NotIndexed("Upload a case PDF before asking questions".to_string()))?;

    tracing::info!("Question about {}: {}", active.document.filename, question);

    let answer = state.engine().answer(&active.index, question).await?;

    Ok(Json(AskResponse::new(answer, start.elapsed().as_millis() as u64)))
}
