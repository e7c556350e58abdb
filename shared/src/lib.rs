//! Startkit Shared Library
//!
//! This crate contains the account models, API types and validation rules
//! used by the backend and its clients.

pub mod errors;
pub mod models;
pub mod types;
pub mod validation;

// Re-export commonly used items
pub use errors::*;
pub use models::{ResetToken, User};
pub use types::*;
