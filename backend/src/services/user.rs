//! User service for account management
//!
//! Password hashing runs on the blocking thread pool; every request type is
//! validated before the store is touched.

use crate::auth::PasswordService;
use crate::error::ApiError;
use crate::repositories::{DuplicateEmail, NewUser, UserStore, UserUpdate};
use startkit_shared::{CreateUserRequest, UpdateUserRequest, User};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

const USER_NOT_FOUND: &str = "user not found.";
const EMAIL_TAKEN: &str = "Email already registered";

/// Convert a store error, surfacing duplicate emails as conflicts
fn store_error(err: anyhow::Error) -> ApiError {
    if err.downcast_ref::<DuplicateEmail>().is_some() {
        ApiError::Conflict(EMAIL_TAKEN.to_string())
    } else {
        ApiError::Internal(err)
    }
}

/// User service for account CRUD
pub struct UserService;

impl UserService {
    /// Register a new user
    pub async fn create(
        users: &dyn UserStore,
        passwords: PasswordService,
        req: CreateUserRequest,
    ) -> Result<User, ApiError> {
        req.validate()?;

        if users.email_exists(&req.email).await.map_err(ApiError::Internal)? {
            return Err(ApiError::Conflict(EMAIL_TAKEN.to_string()));
        }

        let password_hash = passwords
            .hash_async(req.password)
            .await
            .map_err(ApiError::Internal)?;

        let user = users
            .insert(NewUser {
                email: req.email,
                first_name: req.first_name,
                last_name: req.last_name,
                social_name: req.social_name,
                date_of_birth: req.date_of_birth,
                password_hash,
            })
            .await
            .map_err(store_error)?;

        info!(user_id = %user.id, "User registered");

        Ok(user)
    }

    /// Get a user by id
    pub async fn get(users: &dyn UserStore, id: Uuid) -> Result<User, ApiError> {
        users
            .find_by_id(id)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| ApiError::NotFound(USER_NOT_FOUND.to_string()))
    }

    /// Replace a user's profile fields
    pub async fn update(
        users: &dyn UserStore,
        id: Uuid,
        req: UpdateUserRequest,
    ) -> Result<User, ApiError> {
        req.validate()?;

        let user = users
            .update(
                id,
                UserUpdate {
                    email: req.email,
                    first_name: req.first_name,
                    last_name: req.last_name,
                    social_name: req.social_name,
                    date_of_birth: req.date_of_birth,
                },
            )
            .await
            .map_err(store_error)?
            .ok_or_else(|| ApiError::NotFound(USER_NOT_FOUND.to_string()))?;

        info!(user_id = %user.id, "User updated");

        Ok(user)
    }

    /// Delete a user and their outstanding reset tokens
    pub async fn delete(users: &dyn UserStore, id: Uuid) -> Result<(), ApiError> {
        if !users.delete(id).await.map_err(ApiError::Internal)? {
            return Err(ApiError::NotFound(USER_NOT_FOUND.to_string()));
        }

        info!(user_id = %id, "User deleted");

        Ok(())
    }
}
