//! API request and response types
//!
//! Validation rules live on the request types as `validator` annotations and
//! are checked by the backend before any database access.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Cow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::User;
use crate::validation::{validate_email, validate_password};

/// Token type reported for issued access tokens
pub const BEARER_TOKEN_TYPE: &str = "bearer";

/// API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

/// Registration request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(custom(function = "validate_email"))]
    pub email: String,
    #[validate(length(min = 3, message = "First name must be at least 3 characters long"))]
    pub first_name: String,
    #[validate(length(min = 3, message = "Last name must be at least 3 characters long"))]
    pub last_name: String,
    #[serde(default)]
    #[validate(length(min = 3, message = "Social name must be at least 3 characters long"))]
    pub social_name: Option<String>,
    pub date_of_birth: NaiveDate,
    #[validate(custom(function = "validate_password"))]
    pub password: String,
}

/// Profile update request
///
/// `email`, names and date of birth are always written. An omitted
/// `social_name` keeps the stored value and an explicit `null` clears it.
/// The password is changed through the reset flow.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_social_name_patch"))]
pub struct UpdateUserRequest {
    #[validate(custom(function = "validate_email"))]
    pub email: String,
    #[validate(length(min = 3, message = "First name must be at least 3 characters long"))]
    pub first_name: String,
    #[validate(length(min = 3, message = "Last name must be at least 3 characters long"))]
    pub last_name: String,
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub social_name: Option<Option<String>>,
    pub date_of_birth: NaiveDate,
}

/// Wrap a field that was present in the payload, `null` included, in `Some`
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

fn validate_social_name_patch(req: &UpdateUserRequest) -> Result<(), ValidationError> {
    match &req.social_name {
        Some(Some(name)) if name.chars().count() < 3 => Err(ValidationError::new("length")
            .with_message(Cow::Borrowed("Social name must be at least 3 characters long"))),
        _ => Ok(()),
    }
}

/// Public view of a user account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub social_name: Option<String>,
    pub date_of_birth: NaiveDate,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            social_name: user.social_name,
            date_of_birth: user.date_of_birth,
        }
    }
}

/// OAuth2-style password login form; the email is sent as `username`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Issued access token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessToken {
    pub token: String,
    pub token_type: String,
    /// Lifetime in minutes
    pub expires_in: i64,
}

/// Password reset request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RequestPasswordResetRequest {
    #[validate(custom(function = "validate_email"))]
    pub email: String,
}

/// Response to a password reset request.
///
/// The message is identical whether or not the email is registered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordResetRequested {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Password change using a reset token
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    pub token: String,
    #[validate(custom(function = "validate_password"))]
    pub new_password: String,
}

/// Generic confirmation message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Service health report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<ComponentHealth>,
}

/// Readiness of one dependency of the credential manager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub name: String,
    pub healthy: bool,
}
