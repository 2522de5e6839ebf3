use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::middleware::AuthUser;
use crate::api::state::AppState;
use crate::db::{Conversation, ConversationRepository, ConversationScope};
use crate::error::AppError;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversationRequest {
    pub participant_id: Option<String>,
    pub job_id: Option<String>,
    pub application_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConversationIdResponse {
    pub id: String,
}

/// Blank strings count as absent scope keys.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// GET /api/conversations (requires auth)
pub async fn list_conversations(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<Conversation>>, AppError> {
    let conversations = ConversationRepository::list_for_user(&state.db, &auth.user_id).await?;
    Ok(Json(conversations))
}

/// POST /api/conversations (requires auth)
///
/// 200 with the existing id, or 201 when this call created the conversation.
pub async fn create_conversation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<CreateConversationRequest>,
) -> Result<(StatusCode, Json<ConversationIdResponse>), AppError> {
    let participant_id = non_blank(req.participant_id)
        .ok_or_else(|| AppError::Validation("participantId is required".to_string()))?;

    if participant_id == auth.user_id {
        return Err(AppError::Validation(
            "Cannot start a conversation with yourself".to_string(),
        ));
    }

    let scope = ConversationScope {
        job_id: non_blank(req.job_id),
        application_id: non_blank(req.application_id),
    };

    let (conversation, created) =
        ConversationRepository::find_or_create(&state.db, &auth.user_id, &participant_id, &scope)
            .await?;

    let status = if created {
        tracing::info!(conversation_id = %conversation.id, "conversation created");
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(ConversationIdResponse { id: conversation.id })))
}
