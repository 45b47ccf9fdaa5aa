//! Case upload endpoint

use axum::{
    extract::{Multipart, State},
    Json,
};
use std::time::Instant;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{DocumentSummary, UploadResponse};

/// Multipart field carrying the PDF
const FILE_FIELD: &str = "file";

/// POST /api/upload - Store, load and index a case PDF
pub async fn upload_case(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let start = Instant::now();

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::load("upload", format!("Failed to read multipart field: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| Error::load(&filename, format!("Failed to read file: {}", e)))?;
        upload = Some((filename, data));
        break;
    }

    let (filename, data) = upload
        .ok_or_else(|| Error::load("upload", format!("Request has no `{}` field", FILE_FIELD)))?;
    tracing::info!("Processing upload: {} ({} bytes)", filename, data.len());

    let report = state
        .engine()
        .ingest(state.uploads(), &filename, data.to_vec())
        .await?;

    let response = UploadResponse {
        document: DocumentSummary::from(&report.document),
        pages: report.pages,
        chunks: report.index.chunk_count,
        collection: report.index.collection.clone(),
        processing_time_ms: start.elapsed().as_millis() as u64,
    };

    state.set_active(report.document, report.index);

    Ok(Json(response))
}
