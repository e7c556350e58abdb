//! Authentication module
//!
//! JWT access tokens, password hashing and the bearer-token extractor.

mod jwt;
mod middleware;
mod password;

pub use jwt::{Claims, JwtService, TokenUser};
pub use middleware::AuthUser;
pub use password::{HashScheme, PasswordService};
