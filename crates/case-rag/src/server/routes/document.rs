//! Active document endpoint

use axum::{extract::State, Json};

use crate::error::{Error, Result};
use crate::server::state::AppState;

/// GET /api/document - Describe the active case and its index
pub async fn active_document(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    let active = state
        .active()
        .ok_or_else(|| Error::NotIndexed("No case has been uploaded yet".to_string()))?;

    Ok(Json(serde_json::json!({
        "document": crate::types::DocumentSummary::from(&active.document),
        "index": active.index,
    })))
}
