use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use tracing::info;
use uuid::Uuid;

use openmusic_db::{Database, is_unique_violation, queries};

use crate::error::{ApiError, ApiResult};

/// Registered users and their password hashes.
pub struct CredentialStore {
    db: Arc<Database>,
}

impl CredentialStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn register(&self, username: &str, password: &str, fullname: &str) -> ApiResult<String> {
        // Hash password with Argon2id
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("password hashing failed: {}", e)))?
            .to_string();

        let user_id = new_id("user");

        self.db.with_tx(|tx| {
            if queries::user_by_username(tx, username)?.is_some() {
                return Err(ApiError::Conflict("Username already exists"));
            }

            queries::insert_user(tx, &user_id, username, &password_hash, fullname).map_err(|e| {
                if is_unique_violation(&e) {
                    ApiError::Conflict("Username already exists")
                } else {
                    ApiError::Internal(e)
                }
            })
        })?;

        info!("Registered user {} ({})", username, user_id);
        Ok(user_id)
    }

    /// Resolves a username/password pair to a user id.
    pub fn authenticate(&self, username: &str, password: &str) -> ApiResult<String> {
        let user = self
            .db
            .get_user_by_username(username)?
            .ok_or(ApiError::Unauthorized("Invalid credentials"))?;

        let parsed_hash = PasswordHash::new(&user.password)
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("corrupt password hash: {}", e)))?;

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| ApiError::Unauthorized("Invalid credentials"))?;

        Ok(user.id)
    }
}

/// `<prefix>-<uuid without dashes>`
pub fn new_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4().simple())
}
