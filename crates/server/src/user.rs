//! User API endpoints.

use api_types::user::{User, UserNew};
use axum::{
    Extension, Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use engine::{EngineError, Resource};

use crate::{ServerError, server::ServerState};

fn user_view(user: engine::User) -> User {
    User {
        id: user.id,
        name: user.name,
        email: user.email,
        created_at: user.created_at,
    }
}

/// Handle requests for registering a new user
pub async fn user_new(
    State(state): State<ServerState>,
    payload: Result<Json<UserNew>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), ServerError> {
    let Json(payload) = payload?;
    let user = state
        .engine
        .register_user(&payload.name, &payload.email, &payload.password)
        .await?;
    tracing::info!(user_id = user.id, "user registered");

    Ok((StatusCode::CREATED, Json(user_view(user))))
}

/// List every user, oldest first
pub async fn list(State(state): State<ServerState>) -> Result<Json<Vec<User>>, ServerError> {
    let users = state.engine.list_users().await?;
    Ok(Json(users.into_iter().map(user_view).collect()))
}

/// Handle requests for a single user
pub async fn get(
    State(state): State<ServerState>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<User>, ServerError> {
    let Path(id) = id?;
    let user = state
        .engine
        .user(id)
        .await?
        .ok_or(EngineError::NotFound(Resource::User, id))?;
    Ok(Json(user_view(user)))
}

/// Return the user the bearer token belongs to
pub async fn me(Extension(user): Extension<engine::User>) -> Json<User> {
    Json(user_view(user))
}
