//! Business logic services
//!
//! Services encapsulate business logic and coordinate between
//! repositories and the auth primitives.

pub mod credentials;
pub mod user;

pub use credentials::{CredentialManager, CredentialSettings};
pub use user::UserService;
