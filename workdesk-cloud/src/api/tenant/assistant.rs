//! POST /api/tenant/assistant

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use shared::error::AppError;

use crate::gemini;
use crate::state::AppState;

const MAX_PROMPT_LEN: usize = 4000;

#[derive(Deserialize)]
pub struct AssistantRequest {
    pub prompt: String,
}

#[derive(Serialize)]
pub struct AssistantResponse {
    pub text: String,
}

pub async fn ask_assistant(
    State(state): State<AppState>,
    Json(req): Json<AssistantRequest>,
) -> Result<Json<AssistantResponse>, AppError> {
    let prompt = req.prompt.trim();
    if prompt.is_empty() || prompt.chars().count() > MAX_PROMPT_LEN {
        return Err(AppError::validation("Prompt must be 1-4000 characters")
            .with_detail("field", "prompt"));
    }

    let text = gemini::ask(state.assistant.as_ref(), prompt).await;
    Ok(Json(AssistantResponse { text }))
}
