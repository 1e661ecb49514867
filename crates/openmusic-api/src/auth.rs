use std::sync::Arc;

use axum::{extract::State, http::StatusCode};
use tracing::info;

use openmusic_db::Database;
use openmusic_types::api::{
    AccessTokenResponse, LoginRequest, LoginResponse, RefreshTokenRequest, RegisterRequest,
    RegisterResponse,
};

use crate::catalog::Catalog;
use crate::collaborations::CollaborationRegistry;
use crate::error::ApiResult;
use crate::extract::Payload;
use crate::playlists::PlaylistService;
use crate::response::Reply;
use crate::run_blocking;
use crate::tokens::{Clock, TokenIssuer};
use crate::users::CredentialStore;

pub type AppState = Arc<AppStateInner>;

/// Every component, wired to the same storage handle.
pub struct AppStateInner {
    pub users: CredentialStore,
    pub tokens: TokenIssuer,
    pub collaborations: CollaborationRegistry,
    pub playlists: PlaylistService,
    pub catalog: Catalog,
}

impl AppStateInner {
    pub fn new(db: Arc<Database>, access_key: &str, refresh_key: &str, clock: Arc<dyn Clock>) -> Self {
        Self {
            users: CredentialStore::new(db.clone()),
            tokens: TokenIssuer::new(db.clone(), access_key, refresh_key, clock),
            collaborations: CollaborationRegistry::new(db.clone()),
            playlists: PlaylistService::new(db.clone()),
            catalog: Catalog::new(db),
        }
    }
}

/// POST /users
pub async fn register(
    State(state): State<AppState>,
    Payload(req): Payload<RegisterRequest>,
) -> ApiResult<Reply<RegisterResponse>> {
    let user_id =
        run_blocking(move || state.users.register(&req.username, &req.password, &req.fullname))
            .await?;

    Ok(Reply::created(RegisterResponse { user_id }))
}

/// POST /authentications
pub async fn login(
    State(state): State<AppState>,
    Payload(req): Payload<LoginRequest>,
) -> ApiResult<Reply<LoginResponse>> {
    let (access_token, refresh_token) = run_blocking(move || {
        let user_id = state.users.authenticate(&req.username, &req.password)?;
        let access_token = state.tokens.issue_access_token(&user_id)?;
        let refresh_token = state.tokens.issue_refresh_token(&user_id)?;
        info!("User {} logged in", user_id);
        Ok((access_token, refresh_token))
    })
    .await?;

    Ok(Reply::created(LoginResponse {
        access_token,
        refresh_token,
    }))
}

/// PUT /authentications
pub async fn refresh(
    State(state): State<AppState>,
    Payload(req): Payload<RefreshTokenRequest>,
) -> ApiResult<Reply<AccessTokenResponse>> {
    let access_token =
        run_blocking(move || state.tokens.rotate_access_token(&req.refresh_token)).await?;

    Ok(Reply::ok(AccessTokenResponse { access_token }))
}

/// DELETE /authentications
pub async fn logout(
    State(state): State<AppState>,
    Payload(req): Payload<RefreshTokenRequest>,
) -> ApiResult<Reply<()>> {
    run_blocking(move || state.tokens.revoke(&req.refresh_token)).await?;

    Ok(Reply::message(StatusCode::OK, "Refresh token deleted successfully"))
}
