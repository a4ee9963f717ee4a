//! The message-send pipeline: validate the input, resolve the two-party
//! conversation, classify the text, persist the row.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use murmur_db::models::MessageRow;
use murmur_types::api::{MessageResponse, SendMessageRequest};

use crate::error::{ApiError, join_error};
use crate::state::AppState;
use crate::time::parse_sqlite_timestamp;

pub async fn send_message(
    State(state): State<AppState>,
    Path(receiver_id): Path<i64>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.content.trim().is_empty() {
        return Err(ApiError::Validation("message content cannot be empty".into()));
    }
    let sender_id = req.sender_id;
    if sender_id == receiver_id {
        return Err(ApiError::Validation(
            "sender and receiver must be different users".into(),
        ));
    }

    // Both parties must exist before anything is written.
    let db = state.clone();
    let (sender, receiver) = tokio::task::spawn_blocking(move || {
        let sender = db.db.get_user_by_id(sender_id)?;
        let receiver = db.db.get_user_by_id(receiver_id)?;
        Ok::<_, anyhow::Error>((sender, receiver))
    })
    .await
    .map_err(join_error)??;

    if sender.is_none() || receiver.is_none() {
        return Err(ApiError::Validation("invalid sender or receiver".into()));
    }

    let db = state.clone();
    let conversation =
        tokio::task::spawn_blocking(move || db.db.resolve_conversation(sender_id, receiver_id))
            .await
            .map_err(join_error)??;

    // Best-effort by contract: a classifier outage degrades the label to
    // neutral instead of failing the send.
    let sentiment = state.classifier.classify(&req.content).await;
    let emoji = sentiment.emoji();

    let db = state.clone();
    let content = req.content;
    let row = tokio::task::spawn_blocking(move || {
        db.db
            .insert_message(conversation.id, sender_id, &content, sentiment.as_str(), emoji)
    })
    .await
    .map_err(join_error)??;

    Ok((StatusCode::CREATED, Json(message_from_row(row))))
}

pub(crate) fn message_from_row(row: MessageRow) -> MessageResponse {
    MessageResponse {
        id: row.id,
        conversation_id: row.conversation_id,
        sender_id: row.sender_id,
        content: row.content,
        sentiment: row.sentiment,
        emoji: row.emoji,
        sent_at: parse_sqlite_timestamp(&row.sent_at),
    }
}
