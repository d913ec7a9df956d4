use crate::AppState;
use crate::api::error::AppError;
use crate::services::extraction::{EntryOutcome, ExtractionReport, Outcome};
use crate::services::trace;
use crate::utils::validation::validate_archive_upload;
use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
};
use serde::Serialize;
use std::io::Cursor;
use utoipa::ToSchema;

/// Multipart form accepted by `/api/upload/`
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    /// ZIP archive to extract
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

#[derive(Serialize, ToSchema)]
pub struct OutcomeResponse {
    pub entry: String,
    pub destination: Option<String>,
    /// "written", "skipped" or "failed"
    pub outcome: String,
    pub reason: Option<String>,
}

impl From<&EntryOutcome> for OutcomeResponse {
    fn from(o: &EntryOutcome) -> Self {
        let (outcome, reason) = match &o.outcome {
            Outcome::Written => ("written", None),
            Outcome::Skipped(reason) => ("skipped", Some(reason.clone())),
            Outcome::Failed(reason) => ("failed", Some(reason.clone())),
        };
        Self {
            entry: o.entry.clone(),
            destination: o.destination.as_ref().map(|p| p.display().to_string()),
            outcome: outcome.to_string(),
            reason,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct UploadResponse {
    pub message: String,
    pub trace_id: String,
    pub archive: String,
    pub written: usize,
    pub skipped: usize,
    pub failed: usize,
    pub outcomes: Vec<OutcomeResponse>,
}

impl UploadResponse {
    fn from_report(report: &ExtractionReport, trace_id: String) -> Self {
        let message = if report.failed() == 0 {
            "Archive uploaded and extracted".to_string()
        } else {
            format!(
                "Archive extracted with {} failed entr{}",
                report.failed(),
                if report.failed() == 1 { "y" } else { "ies" }
            )
        };
        Self {
            message,
            trace_id,
            archive: report.archive.clone(),
            written: report.written(),
            skipped: report.skipped(),
            failed: report.failed(),
            outcomes: report.outcomes.iter().map(OutcomeResponse::from).collect(),
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/upload/",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (
            status = 201,
            description = "Archive extracted (may include per-entry failures)",
            body = UploadResponse
        ),
        (status = 400, description = "Missing file, not a ZIP archive, or archive unreadable"),
        (status = 413, description = "Archive exceeds the configured size limit")
    ),
    tag = "files"
)]
pub async fn upload_archive(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let mut upload = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(|s| s.to_string());
        let data = field.bytes().await?;
        upload = Some((filename, content_type, data));
        break;
    }

    let (filename, content_type, data) =
        upload.ok_or_else(|| AppError::BadRequest("No file uploaded".to_string()))?;

    validate_archive_upload(
        &filename,
        content_type.as_deref(),
        data.len(),
        state.config.max_file_size,
    )?;

    let token = trace::current();
    tracing::info!(
        target: "app.system",
        trace_id = %token,
        archive = %filename,
        size = data.len(),
        "Received archive upload"
    );

    let engine = state.engine.clone();
    let archive_name = filename.clone();
    let engine_token = token.clone();
    let report = trace::spawn_blocking(move || {
        engine.extract(Cursor::new(data), &archive_name, &engine_token)
    })
    .await
    .map_err(|e| AppError::Internal(format!("Extraction task failed: {}", e)))??;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse::from_report(&report, token.to_string())),
    ))
}
