//! Error types shared between the service and its clients

use thiserror::Error;

/// Authentication error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Unknown email or wrong password; deliberately does not say which
    #[error("Incorrect username or password.")]
    InvalidCredentials,

    #[error("Reset token has expired")]
    TokenExpired,

    #[error("Invalid reset token")]
    InvalidToken,

    #[error("Missing token")]
    MissingToken,
}

impl AuthError {
    /// Stable machine-readable code used in API error bodies
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::TokenExpired => "TOKEN_EXPIRED",
            AuthError::InvalidToken => "INVALID_TOKEN",
            AuthError::MissingToken => "MISSING_TOKEN",
        }
    }
}
