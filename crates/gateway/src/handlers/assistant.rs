//! Assistant (chatbot) handler
//!
//! Upstream failure never fails the request: the reply degrades to a
//! fixed fallback text instead.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use validator::Validate;

use crate::AppState;
use inkpress_common::{
    assistant::{Assistant, FALLBACK_REPLY},
    errors::{AppError, Result},
    metrics,
};

#[derive(Debug, Deserialize, Validate)]
pub struct ChatRequest {
    #[validate(length(min = 1, max = 4000))]
    pub message: String,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub reply: String,
    pub degraded: bool,
}

/// POST /assistant - send one message to the external generation service
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: Some("message".to_string()),
    })?;

    let start = Instant::now();

    match state.assistant.send(&request.message).await {
        Ok(reply) => {
            metrics::record_assistant(start.elapsed().as_secs_f64(), true);
            Ok(Json(ChatResponse {
                reply,
                degraded: false,
            }))
        }
        Err(e) => {
            metrics::record_assistant(start.elapsed().as_secs_f64(), false);
            tracing::warn!(
                error = %e,
                model = state.assistant.model_name(),
                "Assistant unavailable, returning degraded reply"
            );
            Ok(Json(ChatResponse {
                reply: FALLBACK_REPLY.to_string(),
                degraded: true,
            }))
        }
    }
}
