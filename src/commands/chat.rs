use super::{ApiError, AppState};
use crate::chat::{ChatReply, RequestContext};
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::Instrument;

#[derive(Debug, Deserialize)]
pub struct ChatBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub user_location: Option<String>,
}

pub async fn test() -> Json<Value> {
    Json(json!({ "status": "AI Backend is running!" }))
}

pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatBody>, JsonRejection>,
) -> Result<Json<ChatReply>, ApiError> {
    let Json(body) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let message = body.message.trim();
    if message.is_empty() {
        return Err(ApiError::BadRequest("Message is required".to_string()));
    }

    let request_id = uuid::Uuid::new_v4().to_string();
    let span = tracing::info_span!("chat", %request_id, model = state.assistant.model_id());

    async {
        tracing::info!(location = body.user_location.as_deref(), "chat request received");
        let mut ctx = RequestContext::open(&state.db)?;
        let reply = state
            .assistant
            .reply(&mut ctx, message, body.user_location.as_deref())
            .await?;
        tracing::info!(buttons = reply.buttons.len(), "chat reply ready");
        Ok::<_, ApiError>(Json(reply))
    }
    .instrument(span)
    .await
}
