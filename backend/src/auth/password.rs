//! Password hashing using argon2 or bcrypt
//!
//! New hashes use the configured scheme. Verification looks at the stored
//! hash itself, so accounts hashed under a previous scheme keep working.
//!
//! # Performance Considerations
//!
//! Both schemes are intentionally CPU-intensive. The async variants run the
//! work on the blocking thread pool.

use anyhow::{bail, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use std::str::FromStr;

const BCRYPT_MIN_COST: u32 = 4;
const BCRYPT_MAX_COST: u32 = 31;

/// Hash algorithm used for new password hashes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashScheme {
    /// Argon2id in PHC string format
    Argon2,
    /// bcrypt with the given cost factor
    Bcrypt { cost: u32 },
}

impl HashScheme {
    /// Build a scheme from the configured algorithm name
    pub fn from_config(algorithm: &str, bcrypt_cost: u32) -> Result<Self> {
        match algorithm.to_ascii_lowercase().as_str() {
            "argon2" | "argon2id" => Ok(HashScheme::Argon2),
            "bcrypt" => {
                if !(BCRYPT_MIN_COST..=BCRYPT_MAX_COST).contains(&bcrypt_cost) {
                    bail!("bcrypt cost must be between {} and {}", BCRYPT_MIN_COST, BCRYPT_MAX_COST);
                }
                Ok(HashScheme::Bcrypt { cost: bcrypt_cost })
            }
            other => bail!("Unknown password hash algorithm: {}", other),
        }
    }
}

impl FromStr for HashScheme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_config(s, bcrypt::DEFAULT_COST)
    }
}

/// Password hashing service
#[derive(Debug, Clone, Copy)]
pub struct PasswordService {
    scheme: HashScheme,
}

impl Default for PasswordService {
    fn default() -> Self {
        Self::new(HashScheme::Argon2)
    }
}

impl PasswordService {
    pub fn new(scheme: HashScheme) -> Self {
        Self { scheme }
    }

    pub fn scheme(&self) -> HashScheme {
        self.scheme
    }

    /// Hash a password with a fresh random salt (blocking operation)
    pub fn hash(&self, password: &str) -> Result<String> {
        match self.scheme {
            HashScheme::Argon2 => {
                let salt = SaltString::generate(&mut OsRng);
                let hash = Argon2::default()
                    .hash_password(password.as_bytes(), &salt)
                    .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;
                Ok(hash.to_string())
            }
            HashScheme::Bcrypt { cost } => bcrypt::hash(password, cost)
                .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e)),
        }
    }

    /// Hash a password on the blocking thread pool
    pub async fn hash_async(&self, password: String) -> Result<String> {
        let service = *self;
        tokio::task::spawn_blocking(move || service.hash(&password))
            .await
            .map_err(|e| anyhow::anyhow!("Task join error: {}", e))?
    }

    /// Verify a password against a stored hash (blocking operation)
    ///
    /// Returns `Ok(false)` on mismatch; `Err` only when the stored hash is unreadable.
    pub fn verify(password: &str, hash: &str) -> Result<bool> {
        if is_bcrypt_hash(hash) {
            return bcrypt::verify(password, hash)
                .map_err(|e| anyhow::anyhow!("Invalid hash format: {}", e));
        }

        let parsed_hash =
            PasswordHash::new(hash).map_err(|e| anyhow::anyhow!("Invalid hash format: {}", e))?;
        match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(anyhow::anyhow!("Password verification failed: {}", e)),
        }
    }

    /// Verify a password on the blocking thread pool
    pub async fn verify_async(password: String, hash: String) -> Result<bool> {
        tokio::task::spawn_blocking(move || Self::verify(&password, &hash))
            .await
            .map_err(|e| anyhow::anyhow!("Task join error: {}", e))?
    }
}

fn is_bcrypt_hash(hash: &str) -> bool {
    ["$2a$", "$2b$", "$2x$", "$2y$"]
        .iter()
        .any(|prefix| hash.starts_with(prefix))
}
