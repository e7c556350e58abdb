//! JWT access token generation and validation
//!
//! Keys are derived once from the configured secret and shared through
//! `Arc`, so the service is cheap to clone into request handlers.

use anyhow::{bail, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use startkit_shared::User;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

/// Identity embedded in every access token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenUser {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    pub user: TokenUser,
}

impl Claims {
    /// Parse the subject back into a user id
    pub fn user_id(&self) -> Result<Uuid> {
        Ok(Uuid::parse_str(&self.sub)?)
    }
}

/// Pre-computed JWT keys
#[derive(Clone)]
struct JwtKeys {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
}

impl JwtKeys {
    fn new(secret: &str) -> Self {
        Self {
            encoding: Arc::new(EncodingKey::from_secret(secret.as_bytes())),
            decoding: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
        }
    }
}

/// JWT service for access token operations
#[derive(Clone)]
pub struct JwtService {
    keys: JwtKeys,
    algorithm: Algorithm,
    access_token_expiry_minutes: i64,
}

impl JwtService {
    /// Create a new JWT service.
    ///
    /// Only the HMAC family (HS256, HS384, HS512) is accepted since the key
    /// is a shared secret.
    pub fn new(secret: &str, algorithm: &str, access_token_expiry_minutes: i64) -> Result<Self> {
        let algorithm = Algorithm::from_str(algorithm)
            .map_err(|e| anyhow::anyhow!("Unknown JWT algorithm {}: {}", algorithm, e))?;
        if !matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            bail!("Unsupported JWT algorithm {:?}: only HMAC algorithms are allowed", algorithm);
        }
        if access_token_expiry_minutes <= 0 {
            bail!("Access token expiry must be positive");
        }

        Ok(Self {
            keys: JwtKeys::new(secret),
            algorithm,
            access_token_expiry_minutes,
        })
    }

    /// Generate an access token for a user, expiring `access_token_expiry_minutes` after `now`
    pub fn generate_access_token(&self, user: &User, now: DateTime<Utc>) -> Result<String> {
        let exp = now + Duration::minutes(self.access_token_expiry_minutes);

        let claims = Claims {
            sub: user.id.to_string(),
            exp: exp.timestamp(),
            user: TokenUser {
                id: user.id.to_string(),
                first_name: user.first_name.clone(),
                last_name: user.last_name.clone(),
                email: user.email.clone(),
            },
        };

        encode(&Header::new(self.algorithm), &claims, &self.keys.encoding)
            .map_err(|e| anyhow::anyhow!("Failed to generate access token: {}", e))
    }

    /// Validate a token signature and expiry and return its claims
    #[inline]
    pub fn validate_access_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(self.algorithm);
        validation.set_required_spec_claims(&["exp", "sub"]);

        let token_data = decode::<Claims>(token, &self.keys.decoding, &validation)
            .map_err(|e| anyhow::anyhow!("Invalid token: {}", e))?;

        Ok(token_data.claims)
    }

    /// Access token lifetime in minutes
    #[inline]
    pub fn access_token_expiry_minutes(&self) -> i64 {
        self.access_token_expiry_minutes
    }
}
