use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// -- Users --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub nickname: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub nickname: String,
}

// -- Messages --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SendMessageRequest {
    pub sender_id: i64,
    pub content: String,
}

/// A stored message. Sentiment and emoji are assigned once at send time
/// and never change afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: i64,
    pub conversation_id: i64,
    pub sender_id: i64,
    pub content: String,
    pub sentiment: String,
    pub emoji: String,
    pub sent_at: DateTime<Utc>,
}

// -- Conversations --

/// One row of the left-panel conversation listing: the counterpart plus
/// a preview of the latest message. The message fields are null for a
/// conversation nobody has written to yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub conversation_id: i64,
    pub other_user: Option<UserSummary>,
    pub last_message: Option<String>,
    pub last_sent_at: Option<DateTime<Utc>>,
    pub last_sender_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i64,
    pub nickname: String,
}
