use std::sync::Arc;

use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::info;

use openmusic_db::{Database, catalog, playlists};
use openmusic_types::api::{
    ActivityEntry, CreatePlaylistRequest, PlaylistActivities, PlaylistCreated, PlaylistDetail,
    PlaylistDetailResponse, PlaylistList, PlaylistSongRequest, PlaylistSummary, SongSummary,
};
use openmusic_types::models::ActivityAction;

use crate::access::{AccessLevel, authorize, load_playlist};
use crate::activities;
use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};
use crate::extract::Payload;
use crate::middleware::AuthUser;
use crate::response::Reply;
use crate::run_blocking;
use crate::users::new_id;

/// Playlist lifecycle and membership. Every playlist-scoped call goes
/// through [`authorize`] first, inside the same transaction as its writes.
pub struct PlaylistService {
    db: Arc<Database>,
}

impl PlaylistService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn create(&self, name: &str, owner_id: &str) -> ApiResult<String> {
        let id = new_id("playlist");
        self.db
            .with_conn(|conn| playlists::insert_playlist(conn, &id, name, owner_id))?;

        info!("Playlist {} created by {}", id, owner_id);
        Ok(id)
    }

    /// Owned or shared with `user_id`.
    pub fn list_for(&self, user_id: &str) -> ApiResult<Vec<PlaylistSummary>> {
        let rows = self
            .db
            .with_conn(|conn| playlists::playlists_visible_to(conn, user_id))?;

        Ok(rows
            .into_iter()
            .map(|row| PlaylistSummary {
                id: row.id,
                name: row.name,
                username: row.username,
            })
            .collect())
    }

    pub fn delete(&self, playlist_id: &str, requesting_user_id: &str) -> ApiResult<()> {
        self.db.with_tx(|tx| {
            let playlist = load_playlist(tx, playlist_id)?;
            authorize(tx, &playlist, requesting_user_id, AccessLevel::Owner)?;
            playlists::delete_playlist(tx, playlist_id)?;
            Ok::<_, ApiError>(())
        })?;

        info!("Playlist {} deleted", playlist_id);
        Ok(())
    }

    pub fn add_song(
        &self,
        playlist_id: &str,
        song_id: &str,
        requesting_user_id: &str,
    ) -> ApiResult<()> {
        self.db.with_tx(|tx| {
            let playlist = load_playlist(tx, playlist_id)?;
            authorize(tx, &playlist, requesting_user_id, AccessLevel::Contributor)?;

            if !catalog::song_exists(tx, song_id)? {
                return Err(ApiError::NotFound("Song not found"));
            }
            if !playlists::insert_playlist_song(tx, &new_id("playlist-song"), playlist_id, song_id)? {
                return Err(ApiError::Conflict("Song is already in the playlist"));
            }

            activities::record(tx, playlist_id, requesting_user_id, song_id, ActivityAction::Add)
        })
    }

    pub fn remove_song(
        &self,
        playlist_id: &str,
        song_id: &str,
        requesting_user_id: &str,
    ) -> ApiResult<()> {
        self.db.with_tx(|tx| {
            let playlist = load_playlist(tx, playlist_id)?;
            authorize(tx, &playlist, requesting_user_id, AccessLevel::Contributor)?;

            if playlists::delete_playlist_song(tx, playlist_id, song_id)? == 0 {
                return Err(ApiError::NotFound("Song not found in the playlist"));
            }

            activities::record(tx, playlist_id, requesting_user_id, song_id, ActivityAction::Remove)
        })
    }

    pub fn list_songs(&self, playlist_id: &str, requesting_user_id: &str) -> ApiResult<PlaylistDetail> {
        self.db.with_conn(|conn| {
            let playlist = load_playlist(conn, playlist_id)?;
            authorize(conn, &playlist, requesting_user_id, AccessLevel::Contributor)?;

            let owner = openmusic_db::queries::user_by_id(conn, &playlist.owner)?
                .ok_or_else(|| anyhow::anyhow!("playlist {} has no owner row", playlist.id))?;
            let songs = playlists::songs_in_playlist(conn, playlist_id)?
                .into_iter()
                .map(|s| SongSummary {
                    id: s.id,
                    title: s.title,
                    performer: s.performer,
                })
                .collect();

            Ok(PlaylistDetail {
                id: playlist.id,
                name: playlist.name,
                username: owner.username,
                songs,
            })
        })
    }

    pub fn list_activity(
        &self,
        playlist_id: &str,
        requesting_user_id: &str,
    ) -> ApiResult<Vec<ActivityEntry>> {
        self.db.with_conn(|conn| {
            let playlist = load_playlist(conn, playlist_id)?;
            authorize(conn, &playlist, requesting_user_id, AccessLevel::Contributor)?;
            activities::list_for_playlist(conn, playlist_id)
        })
    }
}

// -- Handlers --

/// POST /playlists
pub async fn create_playlist(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Payload(req): Payload<CreatePlaylistRequest>,
) -> ApiResult<Reply<PlaylistCreated>> {
    let playlist_id = run_blocking(move || state.playlists.create(&req.name, &user.user_id)).await?;
    Ok(Reply::created(PlaylistCreated { playlist_id }))
}

/// GET /playlists
pub async fn get_playlists(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Reply<PlaylistList>> {
    let playlists = run_blocking(move || state.playlists.list_for(&user.user_id)).await?;
    Ok(Reply::ok(PlaylistList { playlists }))
}

/// DELETE /playlists/{id}
pub async fn delete_playlist(
    State(state): State<AppState>,
    Path(playlist_id): Path<String>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Reply<()>> {
    run_blocking(move || state.playlists.delete(&playlist_id, &user.user_id)).await?;
    Ok(Reply::message(StatusCode::OK, "Playlist deleted successfully"))
}

/// POST /playlists/{id}/songs
pub async fn add_song(
    State(state): State<AppState>,
    Path(playlist_id): Path<String>,
    Extension(user): Extension<AuthUser>,
    Payload(req): Payload<PlaylistSongRequest>,
) -> ApiResult<Reply<()>> {
    run_blocking(move || {
        state
            .playlists
            .add_song(&playlist_id, &req.song_id, &user.user_id)
    })
    .await?;
    Ok(Reply::message(StatusCode::CREATED, "Song added to playlist successfully"))
}

/// GET /playlists/{id}/songs
pub async fn get_songs(
    State(state): State<AppState>,
    Path(playlist_id): Path<String>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Reply<PlaylistDetailResponse>> {
    let playlist =
        run_blocking(move || state.playlists.list_songs(&playlist_id, &user.user_id)).await?;
    Ok(Reply::ok(PlaylistDetailResponse { playlist }))
}

/// DELETE /playlists/{id}/songs
pub async fn remove_song(
    State(state): State<AppState>,
    Path(playlist_id): Path<String>,
    Extension(user): Extension<AuthUser>,
    Payload(req): Payload<PlaylistSongRequest>,
) -> ApiResult<Reply<()>> {
    run_blocking(move || {
        state
            .playlists
            .remove_song(&playlist_id, &req.song_id, &user.user_id)
    })
    .await?;
    Ok(Reply::message(StatusCode::OK, "Song deleted from playlist successfully"))
}

/// GET /playlists/{id}/activities
pub async fn get_activities(
    State(state): State<AppState>,
    Path(playlist_id): Path<String>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Reply<PlaylistActivities>> {
    let id = playlist_id.clone();
    let activities = run_blocking(move || state.playlists.list_activity(&id, &user.user_id)).await?;
    Ok(Reply::ok(PlaylistActivities {
        playlist_id,
        activities,
    }))
}
