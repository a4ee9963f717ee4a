use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use murmur_db::models::UserRow;
use murmur_types::api::{LoginRequest, RegisterRequest};
use murmur_types::models::User;

use crate::error::{ApiError, join_error};
use crate::state::AppState;
use crate::time::parse_sqlite_timestamp;

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let nickname = req.nickname.trim().to_string();
    if nickname.is_empty() {
        return Err(ApiError::Validation("nickname cannot be empty".into()));
    }

    let db = state.clone();
    let lookup = nickname.clone();
    let taken = tokio::task::spawn_blocking(move || db.db.get_user_by_nickname(&lookup))
        .await
        .map_err(join_error)??
        .is_some();
    if taken {
        return Err(ApiError::Conflict("nickname already taken".into()));
    }

    let db = state.clone();
    let insert = nickname.clone();
    let created = tokio::task::spawn_blocking(move || db.db.create_user(&insert))
        .await
        .map_err(join_error)?;

    // Two concurrent registrations can both pass the lookup above; the
    // UNIQUE constraint decides the winner and the loser sees a conflict.
    let row = match created {
        Ok(row) => row,
        Err(e) if murmur_db::is_unique_violation(&e) => {
            return Err(ApiError::Conflict("nickname already taken".into()));
        }
        Err(e) => return Err(e.into()),
    };

    Ok((StatusCode::CREATED, Json(user_from_row(row))))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let nickname = req.nickname.trim().to_string();

    let db = state.clone();
    let row = tokio::task::spawn_blocking(move || db.db.get_user_by_nickname(&nickname))
        .await
        .map_err(join_error)??
        .ok_or_else(|| ApiError::NotFound("no user with that nickname".into()))?;

    Ok(Json(user_from_row(row)))
}

pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.list_users())
        .await
        .map_err(join_error)??;

    let users: Vec<User> = rows.into_iter().map(user_from_row).collect();
    Ok(Json(users))
}

pub(crate) fn user_from_row(row: UserRow) -> User {
    User {
        id: row.id,
        nickname: row.nickname,
        created_at: parse_sqlite_timestamp(&row.created_at),
    }
}
