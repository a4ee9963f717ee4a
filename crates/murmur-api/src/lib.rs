//! HTTP surface of the murmur server: user registration and login, the
//! message-send pipeline, and the conversation/message listings.

pub mod conversations;
pub mod error;
pub mod messages;
pub mod state;
pub mod users;

mod time;

use axum::Router;
use axum::routing::{get, post};

use crate::state::AppState;

/// All API routes. Lives here rather than in the binary so integration
/// tests can drive the full surface in-process.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/users/register", post(users::register))
        .route("/api/users/login", post(users::login))
        .route("/api/users", get(users::list_users))
        .route("/api/messages/user/{user_id}", post(messages::send_message))
        .route(
            "/api/messages/user/{user_id}/{other_id}",
            get(conversations::messages_between),
        )
        .route(
            "/api/messages/conversation/{conversation_id}",
            get(conversations::conversation_messages),
        )
        .route(
            "/api/conversations/of-user/{user_id}",
            get(conversations::conversations_of_user),
        )
        .with_state(state)
}
