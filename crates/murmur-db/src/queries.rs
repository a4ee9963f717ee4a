use crate::Database;
use crate::models::{ConversationRow, ConversationSummaryRow, MessageRow, UserRow};
use anyhow::{Result, anyhow};
use rusqlite::Connection;

impl Database {
    // -- Users --

    pub fn create_user(&self, nickname: &str) -> Result<UserRow> {
        self.with_conn_mut(|conn| {
            conn.execute("INSERT INTO users (nickname) VALUES (?1)", [nickname])?;
            let id = conn.last_insert_rowid();
            query_user_by_id(conn, id)?.ok_or_else(|| anyhow!("User {} missing after insert", id))
        })
    }

    pub fn get_user_by_nickname(&self, nickname: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_nickname(conn, nickname))
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    pub fn list_users(&self) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, nickname, created_at FROM users ORDER BY id")?;

            let rows = stmt
                .query_map([], |row| {
                    Ok(UserRow {
                        id: row.get(0)?,
                        nickname: row.get(1)?,
                        created_at: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    // -- Conversations --

    /// Find the two-party conversation for a pair of users, or create it.
    ///
    /// Creation inserts the conversation and both membership rows in one
    /// transaction, guarded by the UNIQUE pair key. Losing the race to a
    /// concurrent first contact surfaces as a constraint hit, and the
    /// winner's row is returned instead.
    pub fn resolve_conversation(&self, a: i64, b: i64) -> Result<ConversationRow> {
        self.with_conn_mut(|conn| {
            if let Some(conv) = lookup_pair_conversation(conn, a, b)? {
                return Ok(conv);
            }

            match create_pair_conversation(conn, a, b) {
                Ok(conv) => Ok(conv),
                Err(e) if is_unique_violation(&e) => lookup_pair_conversation(conn, a, b)?
                    .ok_or_else(|| anyhow!("Conversation for pair {} missing after constraint hit", pair_key(a, b))),
                Err(e) => Err(e),
            }
        })
    }

    /// Read-only half of conversation resolution. Never creates anything.
    pub fn find_conversation(&self, a: i64, b: i64) -> Result<Option<ConversationRow>> {
        self.with_conn(|conn| lookup_pair_conversation(conn, a, b))
    }

    /// Listing entries for every conversation the user belongs to, most
    /// recent message first. Conversations without messages sort last.
    /// Single joined query (no per-conversation round trips).
    pub fn get_conversation_summaries(&self, user_id: i64) -> Result<Vec<ConversationSummaryRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT cm.conversation_id,
                        ou.id, ou.nickname,
                        lm.content, lm.sent_at, lm.sender_id
                 FROM conversation_members cm
                 LEFT JOIN conversation_members om
                     ON om.conversation_id = cm.conversation_id AND om.user_id != cm.user_id
                 LEFT JOIN users ou ON ou.id = om.user_id
                 LEFT JOIN messages lm ON lm.id = (
                     SELECT m.id FROM messages m
                     WHERE m.conversation_id = cm.conversation_id
                     ORDER BY m.sent_at DESC, m.id DESC
                     LIMIT 1
                 )
                 WHERE cm.user_id = ?1
                 ORDER BY lm.sent_at DESC, cm.conversation_id DESC",
            )?;

            let rows = stmt
                .query_map([user_id], |row| {
                    Ok(ConversationSummaryRow {
                        conversation_id: row.get(0)?,
                        other_user_id: row.get(1)?,
                        other_nickname: row.get(2)?,
                        last_message: row.get(3)?,
                        last_sent_at: row.get(4)?,
                        last_sender_id: row.get(5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    // -- Messages --

    pub fn insert_message(
        &self,
        conversation_id: i64,
        sender_id: i64,
        content: &str,
        sentiment: &str,
        emoji: &str,
    ) -> Result<MessageRow> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO messages (conversation_id, sender_id, content, sentiment, emoji)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![conversation_id, sender_id, content, sentiment, emoji],
            )?;
            let id = conn.last_insert_rowid();
            query_message_by_id(conn, id)?.ok_or_else(|| anyhow!("Message {} missing after insert", id))
        })
    }

    pub fn get_conversation_messages(&self, conversation_id: i64) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, conversation_id, sender_id, content, sentiment, emoji, sent_at
                 FROM messages
                 WHERE conversation_id = ?1
                 ORDER BY sent_at ASC, id ASC",
            )?;

            let rows = stmt
                .query_map([conversation_id], map_message_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}

/// True when the error is a SQLite UNIQUE/constraint violation. Callers
/// use this to turn lost uniqueness races into domain-level outcomes.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<rusqlite::Error>(),
        Some(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

/// Canonical key for the unordered user pair.
fn pair_key(a: i64, b: i64) -> String {
    format!("{}:{}", a.min(b), a.max(b))
}

/// Membership rows restricted to the two users, grouped by conversation,
/// kept when exactly two distinct members remain. A conversation id whose
/// row no longer exists counts as not-found.
fn lookup_pair_conversation(conn: &Connection, a: i64, b: i64) -> Result<Option<ConversationRow>> {
    let conv_id: Option<i64> = conn
        .query_row(
            "SELECT conversation_id FROM conversation_members
             WHERE user_id IN (?1, ?2)
             GROUP BY conversation_id
             HAVING COUNT(DISTINCT user_id) = 2
             ORDER BY conversation_id
             LIMIT 1",
            [a, b],
            |row| row.get(0),
        )
        .optional()?;

    match conv_id {
        Some(id) => query_conversation_by_id(conn, id),
        None => Ok(None),
    }
}

fn create_pair_conversation(conn: &mut Connection, a: i64, b: i64) -> Result<ConversationRow> {
    let key = pair_key(a, b);

    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO conversations (is_group, pair_key) VALUES (0, ?1)",
        [&key],
    )?;
    let conv_id = tx.last_insert_rowid();
    tx.execute(
        "INSERT INTO conversation_members (conversation_id, user_id) VALUES (?1, ?2)",
        rusqlite::params![conv_id, a],
    )?;
    tx.execute(
        "INSERT INTO conversation_members (conversation_id, user_id) VALUES (?1, ?2)",
        rusqlite::params![conv_id, b],
    )?;
    tx.commit()?;

    query_conversation_by_id(conn, conv_id)?
        .ok_or_else(|| anyhow!("Conversation {} missing after insert", conv_id))
}

fn query_conversation_by_id(conn: &Connection, id: i64) -> Result<Option<ConversationRow>> {
    let mut stmt =
        conn.prepare("SELECT id, is_group, name, created_at FROM conversations WHERE id = ?1")?;

    let row = stmt
        .query_row([id], |row| {
            Ok(ConversationRow {
                id: row.get(0)?,
                is_group: row.get(1)?,
                name: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_user_by_nickname(conn: &Connection, nickname: &str) -> Result<Option<UserRow>> {
    let mut stmt =
        conn.prepare("SELECT id, nickname, created_at FROM users WHERE nickname = ?1")?;

    let row = stmt
        .query_row([nickname], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                nickname: row.get(1)?,
                created_at: row.get(2)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_user_by_id(conn: &Connection, id: i64) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare("SELECT id, nickname, created_at FROM users WHERE id = ?1")?;

    let row = stmt
        .query_row([id], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                nickname: row.get(1)?,
                created_at: row.get(2)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_message_by_id(conn: &Connection, id: i64) -> Result<Option<MessageRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, conversation_id, sender_id, content, sentiment, emoji, sent_at
         FROM messages WHERE id = ?1",
    )?;

    let row = stmt.query_row([id], map_message_row).optional()?;

    Ok(row)
}

fn map_message_row(row: &rusqlite::Row<'_>) -> std::result::Result<MessageRow, rusqlite::Error> {
    Ok(MessageRow {
        id: row.get(0)?,
        conversation_id: row.get(1)?,
        sender_id: row.get(2)?,
        content: row.get(3)?,
        sentiment: row.get(4)?,
        emoji: row.get(5)?,
        sent_at: row.get(6)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db_with_users(nicknames: &[&str]) -> (Database, Vec<i64>) {
        let db = Database::open_in_memory().unwrap();
        let ids = nicknames
            .iter()
            .map(|n| db.create_user(n).unwrap().id)
            .collect();
        (db, ids)
    }

    fn total(db: &Database, table: &str) -> i64 {
        db.with_conn(|conn| {
            Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))?)
        })
        .unwrap()
    }

    fn member_count(db: &Database, conversation_id: i64) -> i64 {
        db.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*) FROM conversation_members WHERE conversation_id = ?1",
                [conversation_id],
                |r| r.get(0),
            )?)
        })
        .unwrap()
    }

    #[test]
    fn first_contact_creates_one_conversation_with_two_members() {
        let (db, ids) = db_with_users(&["alice", "bob"]);

        let conv = db.resolve_conversation(ids[0], ids[1]).unwrap();
        assert!(!conv.is_group);

        assert_eq!(member_count(&db, conv.id), 2);
        assert_eq!(total(&db, "conversations"), 1);
    }

    #[test]
    fn repeated_resolution_returns_the_same_conversation() {
        let (db, ids) = db_with_users(&["alice", "bob"]);

        let first = db.resolve_conversation(ids[0], ids[1]).unwrap();
        let again = db.resolve_conversation(ids[0], ids[1]).unwrap();
        let flipped = db.resolve_conversation(ids[1], ids[0]).unwrap();

        assert_eq!(first.id, again.id);
        assert_eq!(first.id, flipped.id);

        assert_eq!(member_count(&db, first.id), 2);
    }

    #[test]
    fn pairs_do_not_share_conversations() {
        let (db, ids) = db_with_users(&["alice", "bob", "carol"]);

        let ab = db.resolve_conversation(ids[0], ids[1]).unwrap();
        let ac = db.resolve_conversation(ids[0], ids[2]).unwrap();
        let bc = db.resolve_conversation(ids[1], ids[2]).unwrap();

        assert_ne!(ab.id, ac.id);
        assert_ne!(ab.id, bc.id);
        assert_ne!(ac.id, bc.id);

        // Each pair still resolves to its own conversation afterwards.
        assert_eq!(db.resolve_conversation(ids[0], ids[1]).unwrap().id, ab.id);
        assert_eq!(db.resolve_conversation(ids[0], ids[2]).unwrap().id, ac.id);
    }

    #[test]
    fn find_conversation_never_creates() {
        let (db, ids) = db_with_users(&["alice", "bob"]);

        assert!(db.find_conversation(ids[0], ids[1]).unwrap().is_none());
        assert_eq!(total(&db, "conversations"), 0);

        let created = db.resolve_conversation(ids[0], ids[1]).unwrap();
        let found = db.find_conversation(ids[1], ids[0]).unwrap().unwrap();
        assert_eq!(found.id, created.id);
    }

    #[test]
    fn duplicate_nickname_is_a_unique_violation() {
        let (db, _) = db_with_users(&["alice"]);

        let err = db.create_user("alice").unwrap_err();
        assert!(is_unique_violation(&err));
    }

    #[test]
    fn messages_are_listed_in_send_order() {
        let (db, ids) = db_with_users(&["alice", "bob"]);
        let conv = db.resolve_conversation(ids[0], ids[1]).unwrap();

        db.insert_message(conv.id, ids[0], "hi", "neutral", "😐").unwrap();
        db.insert_message(conv.id, ids[1], "hey!", "positive", "😃").unwrap();
        db.insert_message(conv.id, ids[0], "ugh", "negative", "😠").unwrap();

        let messages = db.get_conversation_messages(conv.id).unwrap();
        let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["hi", "hey!", "ugh"]);
        assert_eq!(messages[1].sentiment, "positive");
        assert_eq!(messages[1].emoji, "😃");
    }

    #[test]
    fn summaries_order_most_recent_activity_first() {
        let (db, ids) = db_with_users(&["alice", "bob", "carol"]);
        let ab = db.resolve_conversation(ids[0], ids[1]).unwrap();
        let ac = db.resolve_conversation(ids[0], ids[2]).unwrap();

        let old = db.insert_message(ab.id, ids[1], "old news", "neutral", "😐").unwrap();
        let recent = db.insert_message(ac.id, ids[2], "fresh", "positive", "😃").unwrap();

        // Pin distinct timestamps; datetime('now') has one-second granularity.
        db.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE messages SET sent_at = '2026-01-01 10:00:00' WHERE id = ?1",
                [old.id],
            )?;
            conn.execute(
                "UPDATE messages SET sent_at = '2026-01-01 10:05:00' WHERE id = ?1",
                [recent.id],
            )?;
            Ok(())
        })
        .unwrap();

        let summaries = db.get_conversation_summaries(ids[0]).unwrap();
        assert_eq!(summaries.len(), 2);

        assert_eq!(summaries[0].conversation_id, ac.id);
        assert_eq!(summaries[0].other_nickname.as_deref(), Some("carol"));
        assert_eq!(summaries[0].last_message.as_deref(), Some("fresh"));
        assert_eq!(summaries[0].last_sender_id, Some(ids[2]));

        assert_eq!(summaries[1].conversation_id, ab.id);
        assert_eq!(summaries[1].other_nickname.as_deref(), Some("bob"));
        assert_eq!(summaries[1].last_message.as_deref(), Some("old news"));
    }

    #[test]
    fn summaries_include_conversations_without_messages() {
        let (db, ids) = db_with_users(&["alice", "bob"]);
        let conv = db.resolve_conversation(ids[0], ids[1]).unwrap();

        let summaries = db.get_conversation_summaries(ids[0]).unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].conversation_id, conv.id);
        assert_eq!(summaries[0].other_nickname.as_deref(), Some("bob"));
        assert!(summaries[0].last_message.is_none());
        assert!(summaries[0].last_sent_at.is_none());
    }
}
