use std::sync::Arc;

use axum::{Extension, extract::State, http::StatusCode};
use rusqlite::Connection;
use tracing::info;

use openmusic_db::{Database, playlists, queries};
use openmusic_types::api::{CollaborationRequest, CollaborationResponse};

use crate::access::{AccessLevel, authorize, load_playlist};
use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};
use crate::extract::Payload;
use crate::middleware::AuthUser;
use crate::response::Reply;
use crate::run_blocking;
use crate::users::new_id;

pub fn is_collaborator_in(conn: &Connection, playlist_id: &str, user_id: &str) -> ApiResult<bool> {
    Ok(playlists::collaboration_exists(conn, playlist_id, user_id)?)
}

/// Who, besides the owner, may work on a playlist.
pub struct CollaborationRegistry {
    db: Arc<Database>,
}

impl CollaborationRegistry {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn is_collaborator(&self, playlist_id: &str, user_id: &str) -> ApiResult<bool> {
        self.db
            .with_conn(|conn| is_collaborator_in(conn, playlist_id, user_id))
    }

    /// Owner-only. Granting an existing collaborator again returns the
    /// existing collaboration id.
    pub fn grant(
        &self,
        playlist_id: &str,
        collaborator_id: &str,
        requesting_user_id: &str,
    ) -> ApiResult<String> {
        let collaboration_id = self.db.with_tx(|tx| {
            let playlist = load_playlist(tx, playlist_id)?;
            authorize(tx, &playlist, requesting_user_id, AccessLevel::Owner)?;

            if !queries::user_exists(tx, collaborator_id)? {
                return Err(ApiError::NotFound("User not found"));
            }

            Ok(playlists::upsert_collaboration(
                tx,
                &new_id("collab"),
                playlist_id,
                collaborator_id,
            )?)
        })?;

        info!("User {} may now collaborate on {}", collaborator_id, playlist_id);
        Ok(collaboration_id)
    }

    pub fn revoke(
        &self,
        playlist_id: &str,
        collaborator_id: &str,
        requesting_user_id: &str,
    ) -> ApiResult<()> {
        self.db.with_tx(|tx| {
            let playlist = load_playlist(tx, playlist_id)?;
            authorize(tx, &playlist, requesting_user_id, AccessLevel::Owner)?;

            if playlists::delete_collaboration(tx, playlist_id, collaborator_id)? == 0 {
                return Err(ApiError::NotFound("Collaboration not found"));
            }
            Ok(())
        })?;

        info!("User {} no longer collaborates on {}", collaborator_id, playlist_id);
        Ok(())
    }
}

// -- Handlers --

/// POST /collaborations
pub async fn add_collaboration(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Payload(req): Payload<CollaborationRequest>,
) -> ApiResult<Reply<CollaborationResponse>> {
    let collaboration_id = run_blocking(move || {
        state
            .collaborations
            .grant(&req.playlist_id, &req.user_id, &user.user_id)
    })
    .await?;

    Ok(Reply::created(CollaborationResponse { collaboration_id }))
}

/// DELETE /collaborations
pub async fn delete_collaboration(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Payload(req): Payload<CollaborationRequest>,
) -> ApiResult<Reply<()>> {
    run_blocking(move || {
        state
            .collaborations
            .revoke(&req.playlist_id, &req.user_id, &user.user_id)
    })
    .await?;

    Ok(Reply::message(StatusCode::OK, "Collaboration removed successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use openmusic_db::queries::insert_user;

    fn registry() -> (CollaborationRegistry, Arc<Database>) {
        let db = Arc::new(Database::open_in_memory().unwrap());
        db.with_conn(|conn| {
            insert_user(conn, "user-a", "alice", "hash", "Alice")?;
            insert_user(conn, "user-b", "bob", "hash", "Bob")?;
            insert_user(conn, "user-c", "carol", "hash", "Carol")?;
            playlists::insert_playlist(conn, "playlist-1", "Roadtrip", "user-a")
        })
        .unwrap();
        (CollaborationRegistry::new(db.clone()), db)
    }

    #[test]
    fn owner_grants_and_revokes() {
        let (registry, _) = registry();

        registry.grant("playlist-1", "user-b", "user-a").unwrap();
        assert!(registry.is_collaborator("playlist-1", "user-b").unwrap());

        registry.revoke("playlist-1", "user-b", "user-a").unwrap();
        assert!(!registry.is_collaborator("playlist-1", "user-b").unwrap());
    }

    #[test]
    fn only_the_owner_may_grant_or_revoke() {
        let (registry, _) = registry();
        registry.grant("playlist-1", "user-b", "user-a").unwrap();

        // A collaborator cannot pass the grant on, nor remove anyone.
        assert!(matches!(
            registry.grant("playlist-1", "user-c", "user-b"),
            Err(ApiError::Forbidden(_))
        ));
        assert!(matches!(
            registry.revoke("playlist-1", "user-b", "user-b"),
            Err(ApiError::Forbidden(_))
        ));
        assert!(matches!(
            registry.grant("playlist-1", "user-c", "user-c"),
            Err(ApiError::Forbidden(_))
        ));
    }

    #[test]
    fn grant_checks_playlist_then_user() {
        let (registry, _) = registry();
        assert!(matches!(
            registry.grant("playlist-404", "user-b", "user-a"),
            Err(ApiError::NotFound("Playlist not found"))
        ));
        assert!(matches!(
            registry.grant("playlist-1", "user-404", "user-a"),
            Err(ApiError::NotFound("User not found"))
        ));
    }

    #[test]
    fn duplicate_grant_is_idempotent() {
        let (registry, db) = registry();
        let first = registry.grant("playlist-1", "user-b", "user-a").unwrap();
        let second = registry.grant("playlist-1", "user-b", "user-a").unwrap();

        assert_eq!(first, second);
        let count = db
            .with_conn(|conn| playlists::count_collaborations(conn, "playlist-1"))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn revoking_unknown_collaboration_changes_nothing() {
        let (registry, db) = registry();
        registry.grant("playlist-1", "user-b", "user-a").unwrap();

        assert!(matches!(
            registry.revoke("playlist-1", "user-c", "user-a"),
            Err(ApiError::NotFound("Collaboration not found"))
        ));
        let count = db
            .with_conn(|conn| playlists::count_collaborations(conn, "playlist-1"))
            .unwrap();
        assert_eq!(count, 1);
    }
}
