//! API routes for the SOP guide server

pub mod analyze;
pub mod chat;

use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use crate::generation::templates::GREETING;
use crate::generation::TEMPLATE_VERSION;
use crate::server::state::AppState;
use crate::types::ImageKind;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        .route("/chat", post(chat::chat))
        // Image analysis - with larger body limit for uploads
        .route(
            "/analyze",
            post(analyze::analyze_image).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/info", get(info))
}

/// API info endpoint
async fn info(State(state): State<AppState>) -> Json<serde_json::Value> {
    let manifest = state.pipeline().index().manifest();
    let image_kinds: Vec<_> = ImageKind::ALL
        .iter()
        .map(|k| json!({ "kind": k.as_str(), "label": k.label() }))
        .collect();

    Json(json!({
        "name": "sop-guide",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Educational assistant about polycystic ovary syndrome grounded on the ESHRE 2023 guideline",
        "greeting": GREETING,
        "template_version": TEMPLATE_VERSION,
        "image_kinds": image_kinds,
        "index": {
            "collection": manifest.collection,
            "entries": manifest.entry_count,
            "fingerprint": manifest.fingerprint,
            "source_file": manifest.source_file,
            "created_at": manifest.created_at,
        },
        "endpoints": {
            "POST /api/chat": "Ask a question ({query, history})",
            "POST /api/analyze": "Analyze a medical image (multipart: kind, image)",
            "GET /api/info": "This document",
            "GET /health": "Liveness",
            "GET /ready": "Readiness"
        }
    }))
}
