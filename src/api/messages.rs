use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::AuthUser;
use crate::api::state::AppState;
use crate::db::{ConversationRepository, Message, MessageRepository};
use crate::error::AppError;

pub const MAX_MESSAGE_CHARS: usize = 4096;

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SendMessageResponse {
    pub id: String,
    pub created_at: i64,
}

fn conversation_id(raw: &str) -> Result<&str, AppError> {
    let id = raw.trim();
    if id.is_empty() {
        return Err(AppError::Validation("conversationId is required".to_string()));
    }
    Ok(id)
}

/// Trimmed message text, rejected when empty or oversized.
pub fn message_content(raw: Option<&str>) -> Result<&str, AppError> {
    let content = raw.map(str::trim).unwrap_or_default();
    if content.is_empty() {
        return Err(AppError::Validation("Message content is required".to_string()));
    }
    if content.chars().count() > MAX_MESSAGE_CHARS {
        return Err(AppError::Validation(format!(
            "Message must be at most {} characters",
            MAX_MESSAGE_CHARS
        )));
    }
    Ok(content)
}

/// GET /api/messages/{conversation_id} (requires auth)
pub async fn list_messages(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(raw_id): Path<String>,
) -> Result<Json<Vec<Message>>, AppError> {
    let id = conversation_id(&raw_id)?;

    ConversationRepository::get_visible(&state.db, id, &auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Conversation not found".to_string()))?;

    let messages = MessageRepository::list_for_conversation(&state.db, id).await?;
    Ok(Json(messages))
}

/// POST /api/messages/{conversation_id} (requires auth)
pub async fn send_message(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(raw_id): Path<String>,
    Json(req): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<SendMessageResponse>), AppError> {
    let id = conversation_id(&raw_id)?;
    let content = message_content(req.content.as_deref())?;

    ConversationRepository::get_visible(&state.db, id, &auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Conversation not found".to_string()))?;

    let message = MessageRepository::create(&state.db, id, &auth.user_id, content).await?;

    // Last-activity bump is best effort; the message is already stored.
    if let Err(e) = ConversationRepository::touch(&state.db, id, message.created_at).await {
        tracing::warn!(conversation_id = %id, error = %e, "failed to update last_message_at");
    }

    Ok((
        StatusCode::CREATED,
        Json(SendMessageResponse {
            id: message.id,
            created_at: message.created_at,
        }),
    ))
}
