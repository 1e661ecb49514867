pub mod access;
pub mod activities;
pub mod auth;
pub mod catalog;
pub mod collaborations;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod playlists;
pub mod response;
pub mod router;
pub mod tokens;
pub mod users;

use tracing::error;

use crate::error::{ApiError, ApiResult};

/// Runs blocking storage work off the async runtime.
pub(crate) async fn run_blocking<F, T>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> ApiResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal(e.into())
    })?
}
