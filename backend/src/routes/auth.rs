//! Authentication routes
//!
//! Password login (form encoded, email sent as `username`) and the
//! password reset flow.

use crate::error::ApiResult;
use crate::state::AppState;
use axum::{extract::State, routing::post, Form, Json, Router};
use startkit_shared::{
    AccessToken, LoginForm, MessageResponse, PasswordResetRequested, RequestPasswordResetRequest,
    ResetPasswordRequest,
};
use validator::Validate;

/// Returned for every reset request, registered email or not
pub const RESET_REQUESTED_MESSAGE: &str =
    "If the email is registered, a password reset token has been issued.";

pub const PASSWORD_CHANGED_MESSAGE: &str = "Password has been reset successfully.";

/// Create auth routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth", post(login))
        .route("/auth/password-reset", post(request_password_reset))
        .route("/auth/password-reset/confirm", post(confirm_password_reset))
}

/// Login with email and password
///
/// POST /api/v1/auth
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> ApiResult<Json<AccessToken>> {
    let token = state
        .credentials()
        .verify_credentials(&form.username, &form.password)
        .await?;
    Ok(Json(token))
}

/// Request a password reset token
///
/// POST /api/v1/auth/password-reset
async fn request_password_reset(
    State(state): State<AppState>,
    Json(req): Json<RequestPasswordResetRequest>,
) -> ApiResult<Json<PasswordResetRequested>> {
    req.validate()?;

    let token = state.credentials().issue_reset_token(&req.email).await?;

    // TODO: deliver the token by email once a mail transport is configured
    Ok(Json(PasswordResetRequested {
        message: RESET_REQUESTED_MESSAGE.to_string(),
        token: token.filter(|_| state.config().reset.expose_token),
    }))
}

/// Set a new password using a reset token
///
/// POST /api/v1/auth/password-reset/confirm
async fn confirm_password_reset(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    req.validate()?;

    state
        .credentials()
        .change_password(&req.token, &req.new_password)
        .await?;

    Ok(Json(MessageResponse {
        message: PASSWORD_CHANGED_MESSAGE.to_string(),
    }))
}
