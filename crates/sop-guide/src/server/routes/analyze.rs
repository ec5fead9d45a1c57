//! Image analysis endpoint

use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::{Error, Result};
use crate::generation::FailureKind;
use crate::server::state::AppState;
use crate::types::{AnalysisReport, ChatOutcome, ImageKind};

/// Analysis response body
#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    #[serde(flatten)]
    pub report: AnalysisReport,
    pub processing_time_ms: u64,
}

/// POST /api/analyze - Educational analysis of a medical image
///
/// Multipart fields: `kind` (lab, cycle, ultrasound, general; default general)
/// and `image` (PNG or JPEG).
pub async fn analyze_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>> {
    let start = Instant::now();
    let mut kind = ImageKind::default();
    let mut image: Option<Bytes> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::BadRequest(format!("Failed to read multipart field: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "kind" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| Error::BadRequest(format!("Failed to read kind: {}", e)))?;
                kind = text.parse()?;
            }
            "image" => {
                if let Some(filename) = field.file_name() {
                    check_declared_type(filename)?;
                }
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| Error::BadRequest(format!("Failed to read image: {}", e)))?;
                image = Some(data);
            }
            other => {
                tracing::debug!("Ignoring multipart field '{}'", other);
            }
        }
    }

    let data = image
        .filter(|d| !d.is_empty())
        .ok_or_else(|| Error::BadRequest("missing 'image' field".into()))?;

    tracing::info!("Analyze {} image ({} bytes)", kind, data.len());

    let report = match tokio::time::timeout(
        state.request_timeout(),
        state.pipeline().analyze_image_detailed(data, kind),
    )
    .await
    {
        Ok(report) => report,
        Err(_) => {
            tracing::warn!("Image analysis timed out after {:?}", state.request_timeout());
            AnalysisReport::failed(kind, FailureKind::Generic.user_message(), ChatOutcome::Error)
        }
    };

    Ok(Json(AnalyzeResponse {
        report,
        processing_time_ms: start.elapsed().as_millis() as u64,
    }))
}

/// Reject uploads whose filename names a non-image type; content is checked later
fn check_declared_type(filename: &str) -> Result<()> {
    match mime_guess::from_path(filename).first() {
        Some(mime) if mime.type_() != mime_guess::mime::IMAGE => Err(Error::UnsupportedFileType(
            format!("{} ({})", filename, mime.essence_str()),
        )),
        _ => Ok(()),
    }
}
