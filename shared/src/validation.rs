//! Input validation functions
//!
//! This module provides the validation rules for account input.
//! The functions here back the `#[validate(custom(...))]` annotations on the
//! request types in [`crate::types`], and can also be called directly.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex_lite::Regex;
use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

/// Minimum password length
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// A password must contain at least one of these characters
pub const PASSWORD_SPECIAL_CHARACTERS: &str = "!@#$%^&*(),.?\":{}|<>";

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("email pattern is a valid regex")
});

fn rule_violation(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

/// Validate email format (`local@domain.tld`)
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if EMAIL_REGEX.is_match(email) {
        Ok(())
    } else {
        Err(rule_violation("email", "The email is not valid."))
    }
}

/// Validate password strength: minimum length plus one special character
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(rule_violation(
            "password_length",
            "Password must be at least 6 characters long",
        ));
    }
    if !password.chars().any(|c| PASSWORD_SPECIAL_CHARACTERS.contains(c)) {
        return Err(rule_violation(
            "password_special_character",
            "Password must contain at least one special character",
        ));
    }
    Ok(())
}

/// Flatten `validator` errors into one human-readable reason.
///
/// Field errors are reported in field-name order so the message is stable.
pub fn describe_errors(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    let mut messages = Vec::new();
    for (field, kind) in fields {
        if let ValidationErrorsKind::Field(field_errors) = kind {
            for error in field_errors {
                match &error.message {
                    Some(message) => messages.push(message.to_string()),
                    None => messages.push(format!("{} is invalid", field)),
                }
            }
        }
    }

    if messages.is_empty() {
        "Invalid input".to_string()
    } else {
        messages.join("; ")
    }
}
