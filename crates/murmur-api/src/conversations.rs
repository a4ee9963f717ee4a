use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use murmur_types::api::{ConversationSummary, MessageResponse, UserSummary};

use crate::error::{ApiError, join_error};
use crate::messages::message_from_row;
use crate::state::AppState;
use crate::time::parse_sqlite_timestamp;

/// Left-panel listing: one entry per conversation the user belongs to,
/// most recent activity first.
pub async fn conversations_of_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.get_conversation_summaries(user_id))
        .await
        .map_err(join_error)??;

    let summaries: Vec<ConversationSummary> = rows
        .into_iter()
        .map(|row| ConversationSummary {
            conversation_id: row.conversation_id,
            other_user: match (row.other_user_id, row.other_nickname) {
                (Some(id), Some(nickname)) => Some(UserSummary { id, nickname }),
                _ => None,
            },
            last_message: row.last_message,
            last_sent_at: row.last_sent_at.as_deref().map(parse_sqlite_timestamp),
            last_sender_id: row.last_sender_id,
        })
        .collect();

    Ok(Json(summaries))
}

pub async fn conversation_messages(
    State(state): State<AppState>,
    Path(conversation_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.get_conversation_messages(conversation_id))
        .await
        .map_err(join_error)??;

    let messages: Vec<MessageResponse> = rows.into_iter().map(message_from_row).collect();
    Ok(Json(messages))
}

/// Message history between two users; an empty list when they have never
/// spoken. Reads never create a conversation.
pub async fn messages_between(
    State(state): State<AppState>,
    Path((a, b)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || match db.db.find_conversation(a, b)? {
        Some(conv) => db.db.get_conversation_messages(conv.id),
        None => Ok(vec![]),
    })
    .await
    .map_err(join_error)??;

    let messages: Vec<MessageResponse> = rows.into_iter().map(message_from_row).collect();
    Ok(Json(messages))
}
