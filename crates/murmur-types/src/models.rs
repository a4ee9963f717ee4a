use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered user. Returned verbatim by the register/login/list
/// endpoints; there is nothing secret on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub nickname: String,
    pub created_at: DateTime<Utc>,
}
