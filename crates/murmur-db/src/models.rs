/// Database row types — these map directly to SQLite rows.
/// Distinct from murmur-types API models to keep the DB layer independent.

#[derive(Debug)]
pub struct UserRow {
    pub id: i64,
    pub nickname: String,
    pub created_at: String,
}

pub struct ConversationRow {
    pub id: i64,
    pub is_group: bool,
    pub name: Option<String>,
    pub created_at: String,
}

pub struct MessageRow {
    pub id: i64,
    pub conversation_id: i64,
    pub sender_id: i64,
    pub content: String,
    pub sentiment: String,
    pub emoji: String,
    pub sent_at: String,
}

/// One listing entry: the counterpart in a conversation plus its latest
/// message, if any.
pub struct ConversationSummaryRow {
    pub conversation_id: i64,
    pub other_user_id: Option<i64>,
    pub other_nickname: Option<String>,
    pub last_message: Option<String>,
    pub last_sent_at: Option<String>,
    pub last_sender_id: Option<i64>,
}
