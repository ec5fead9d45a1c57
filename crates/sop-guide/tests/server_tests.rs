//! HTTP surface tests driven through the router without binding a socket

mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use common::*;
use sop_guide::generation::templates::{GREETING, IMAGE_DECODE_MESSAGE, NO_CONTEXT_FALLBACK};
use sop_guide::server::{build_router, AppState};
use sop_guide::RagConfig;

const BOUNDARY: &str = "sopguideboundary";

async fn router(model: std::sync::Arc<RecordingModel>) -> Router {
    let state = AppState::new(RagConfig::default(), pipeline_with(model).await);
    state.set_ready(true);
    build_router(state)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn chat_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Multipart body with optional `kind` and `image` parts
fn analyze_request(kind: Option<&str>, image: Option<(&str, &[u8])>) -> Request<Body> {
    let mut body = Vec::new();
    if let Some(kind) = kind {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"kind\"\r\n\r\n{kind}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((filename, data)) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/analyze")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_health_and_ready() {
    let app = router(RecordingModel::answering("ok")).await;

    let response = app
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["ready"], true);
    assert!(body["index_entries"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn test_not_ready_until_marked() {
    let state = AppState::new(
        RagConfig::default(),
        pipeline_with(RecordingModel::answering("ok")).await,
    );
    let response = build_router(state)
        .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_info_exposes_greeting_and_index() {
    let app = router(RecordingModel::answering("ok")).await;
    let response = app
        .oneshot(Request::get("/api/info").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["greeting"], GREETING);
    assert_eq!(body["index"]["collection"], "sop_medical_guide");
    assert_eq!(body["image_kinds"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_chat_answers_with_sources() {
    let model = RecordingModel::answering("La guía ESHRE recomienda ejercicio regular.");
    let app = router(model.clone()).await;

    let response = app
        .oneshot(chat_request(json!({
            "query": "¿El ejercicio regular ayuda?",
            "history": [
                { "role": "user", "content": "Hola" },
                { "role": "assistant", "content": "¡Hola! 💜" }
            ]
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["outcome"], "answered");
    assert!(body["answer"].as_str().unwrap().contains("📚"));
    assert!(!body["sources"].as_array().unwrap().is_empty());
    assert!(model.last_request().unwrap().prompt.contains("Asistente: ¡Hola! 💜"));
}

#[tokio::test]
async fn test_chat_rejects_empty_query() {
    let model = RecordingModel::answering("ok");
    let app = router(model.clone()).await;

    let response = app.oneshot(chat_request(json!({ "query": "   " }))).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn test_chat_fallback_is_a_successful_response() {
    let model = RecordingModel::answering("ok");
    let state = AppState::new(
        RagConfig::default(),
        sop_guide::QueryPipeline::new(
            std::sync::Arc::new(FailingEmbedder),
            std::sync::Arc::new(guide_index().await),
            model.clone(),
            Default::default(),
            4,
        ),
    );

    let response = build_router(state)
        .oneshot(chat_request(json!({ "query": "¿Qué es el SOP?" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["answer"], NO_CONTEXT_FALLBACK);
    assert_eq!(body["outcome"], "no_context");
}

#[tokio::test]
async fn test_analyze_valid_image() {
    let model = RecordingModel::answering("Tus valores de LH aparecen marcados.");
    let app = router(model.clone()).await;

    let png = png_bytes();
    let response = app
        .oneshot(analyze_request(Some("laboratorio"), Some(("resultados.png", &png))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["kind"], "lab");
    assert_eq!(body["outcome"], "answered");
    assert_eq!(body["analysis"], "Tus valores de LH aparecen marcados.");
    assert!(!body["doctor_questions"].as_array().unwrap().is_empty());
    assert_eq!(model.calls(), 1);
}

#[tokio::test]
async fn test_analyze_malformed_image() {
    let model = RecordingModel::answering("ok");
    let app = router(model.clone()).await;

    let response = app
        .oneshot(analyze_request(Some("cycle"), Some(("ciclo.png", b"not a png"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["outcome"], "invalid_image");
    assert_eq!(body["analysis"], IMAGE_DECODE_MESSAGE);
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn test_analyze_rejects_bad_requests() {
    let app = router(RecordingModel::answering("ok")).await;
    let png = png_bytes();

    let missing = app
        .clone()
        .oneshot(analyze_request(Some("lab"), None))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

    let bad_kind = app
        .clone()
        .oneshot(analyze_request(Some("radiografía"), Some(("x.png", &png))))
        .await
        .unwrap();
    assert_eq!(bad_kind.status(), StatusCode::BAD_REQUEST);

    let not_image = app
        .oneshot(analyze_request(None, Some(("informe.pdf", &png))))
        .await
        .unwrap();
    assert_eq!(not_image.status(), StatusCode::BAD_REQUEST);
}
