//! Chat endpoint

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::{Error, Result};
use crate::generation::FailureKind;
use crate::server::state::AppState;
use crate::types::{ChatAnswer, ChatOutcome, SourceRef, Turn};

/// Chat request body
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub query: String,
    /// Previous turns, oldest first
    #[serde(default)]
    pub history: Vec<Turn>,
}

/// Chat response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    pub outcome: ChatOutcome,
    pub sources: Vec<SourceRef>,
    pub processing_time_ms: u64,
}

/// POST /api/chat - Answer a question about SOP
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    let start = Instant::now();

    let query = request.query.trim();
    if query.is_empty() {
        return Err(Error::BadRequest("query must not be empty".into()));
    }

    tracing::info!("Chat query ({} chars, {} history turns)", query.chars().count(), request.history.len());

    let answer = match tokio::time::timeout(
        state.request_timeout(),
        state.pipeline().answer_detailed(query, &request.history),
    )
    .await
    {
        Ok(answer) => answer,
        Err(_) => {
            tracing::warn!("Chat request timed out after {:?}", state.request_timeout());
            ChatAnswer::fixed(FailureKind::Generic.user_message(), ChatOutcome::Error)
        }
    };

    Ok(Json(ChatResponse {
        answer: answer.answer,
        outcome: answer.outcome,
        sources: answer.sources,
        processing_time_ms: start.elapsed().as_millis() as u64,
    }))
}
