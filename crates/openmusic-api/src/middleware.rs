use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use tracing::debug;

use crate::auth::AppState;
use crate::error::ApiError;

/// Identity established from a verified access token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
}

/// Extract and validate the access token from the Authorization header.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let bearer = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or(ApiError::Unauthorized("Missing authentication"))?;

    let claims = state.tokens.verify_access_token(bearer.token()).map_err(|e| {
        debug!("Rejected access token: {}", e);
        ApiError::Unauthorized("Invalid or expired access token")
    })?;

    req.extensions_mut().insert(AuthUser {
        user_id: claims.user_id,
    });
    Ok(next.run(req).await)
}
