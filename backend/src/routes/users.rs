//! User account routes
//!
//! Registration is public; reading, updating and deleting an account
//! require a bearer token.

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::UserService;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use startkit_shared::{CreateUserRequest, UpdateUserRequest, UserResponse};
use uuid::Uuid;

/// Create user routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user))
        .route("/users/auth", post(super::auth::login))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

/// Register a new user
///
/// POST /api/v1/users
async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let user = UserService::create(state.users(), state.passwords(), req).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// GET /api/v1/users/:id
async fn get_user(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<UserResponse>> {
    let user = UserService::get(state.users(), id).await?;
    Ok(Json(user.into()))
}

/// PUT /api/v1/users/:id
async fn update_user(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<Json<UserResponse>> {
    let user = UserService::update(state.users(), id, req).await?;
    Ok(Json(user.into()))
}

/// DELETE /api/v1/users/:id
async fn delete_user(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    UserService::delete(state.users(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
