use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use openmusic_db::{Database, queries};

use crate::error::{ApiError, ApiResult};

/// One hour.
pub const ACCESS_TOKEN_TTL_SECS: i64 = 3_600;
/// Seven days.
pub const REFRESH_TOKEN_TTL_SECS: i64 = 604_800;

/// Source of "now" for issuing and checking tokens.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

/// Signs and checks access/refresh tokens. Refresh tokens are tracked in
/// `refresh_tokens` so they can be revoked; access tokens are not stored.
pub struct TokenIssuer {
    db: Arc<Database>,
    access_key: String,
    refresh_key: String,
    clock: Arc<dyn Clock>,
}

impl TokenIssuer {
    pub fn new(
        db: Arc<Database>,
        access_key: impl Into<String>,
        refresh_key: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            db,
            access_key: access_key.into(),
            refresh_key: refresh_key.into(),
            clock,
        }
    }

    pub fn issue_access_token(&self, user_id: &str) -> ApiResult<String> {
        let (token, _) = self.sign(user_id, &self.access_key, ACCESS_TOKEN_TTL_SECS)?;
        Ok(token)
    }

    /// Signs a refresh token and records it. The token is only handed out
    /// once the row is committed.
    pub fn issue_refresh_token(&self, user_id: &str) -> ApiResult<String> {
        let (token, claims) = self.sign(user_id, &self.refresh_key, REFRESH_TOKEN_TTL_SECS)?;
        let now = claims.iat;

        self.db.with_tx(|tx| {
            let purged = queries::purge_expired_refresh_tokens(tx, user_id, now)?;
            if purged > 0 {
                debug!("Purged {} expired refresh tokens for {}", purged, user_id);
            }
            queries::insert_refresh_token(tx, &token, user_id, claims.exp)?;
            Ok::<_, ApiError>(())
        })?;

        Ok(token)
    }

    /// Returns the user the stored row binds this refresh token to.
    pub fn verify_refresh_token(&self, token: &str) -> ApiResult<String> {
        let row = self
            .db
            .with_conn(|conn| queries::refresh_token(conn, token))?
            .ok_or(ApiError::InvalidToken)?;

        let claims = self.decode(token, &self.refresh_key)?;
        if claims.user_id != row.user_id {
            return Err(ApiError::InvalidToken);
        }

        Ok(row.user_id)
    }

    pub fn rotate_access_token(&self, refresh_token: &str) -> ApiResult<String> {
        let user_id = self.verify_refresh_token(refresh_token)?;
        self.issue_access_token(&user_id)
    }

    pub fn revoke(&self, refresh_token: &str) -> ApiResult<()> {
        let removed = self
            .db
            .with_conn(|conn| queries::delete_refresh_token(conn, refresh_token))?;
        if removed == 0 {
            return Err(ApiError::InvalidToken);
        }
        info!("Refresh token revoked");
        Ok(())
    }

    /// Checks signature and expiry of an access token.
    pub fn verify_access_token(&self, token: &str) -> ApiResult<Claims> {
        self.decode(token, &self.access_key)
    }

    fn sign(&self, user_id: &str, key: &str, ttl_secs: i64) -> ApiResult<(String, Claims)> {
        let now = self.clock.now();
        let claims = Claims {
            user_id: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(ttl_secs)).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(key.as_bytes()),
        )
        .map_err(|e| ApiError::Internal(e.into()))?;

        Ok((token, claims))
    }

    fn decode(&self, token: &str, key: &str) -> ApiResult<Claims> {
        // Expiry is checked against our own clock below.
        let mut validation = Validation::default();
        validation.validate_exp = false;
        validation.leeway = 0;

        let data = decode::<Claims>(token, &DecodingKey::from_secret(key.as_bytes()), &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => ApiError::ExpiredToken,
                _ => ApiError::InvalidToken,
            })?;

        if data.claims.exp <= self.clock.now().timestamp() {
            return Err(ApiError::ExpiredToken);
        }

        Ok(data.claims)
    }
}
