use rusqlite::Connection;
use tracing::warn;

use openmusic_db::models::PlaylistRow;
use openmusic_db::playlists;

use crate::collaborations;
use crate::error::{ApiError, ApiResult};

/// Permission a playlist-scoped operation requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessLevel {
    /// Delete the playlist, grant and revoke collaborators.
    Owner,
    /// Read, add and remove songs, read the activity log.
    Contributor,
}

pub fn load_playlist(conn: &Connection, playlist_id: &str) -> ApiResult<PlaylistRow> {
    playlists::playlist_by_id(conn, playlist_id)?.ok_or(ApiError::NotFound("Playlist not found"))
}

/// Fails with `Forbidden` unless `user_id` holds `level` on `playlist`.
/// Read-only; safe to call inside a caller's transaction.
pub fn authorize(
    conn: &Connection,
    playlist: &PlaylistRow,
    user_id: &str,
    level: AccessLevel,
) -> ApiResult<()> {
    if playlist.owner == user_id {
        return Ok(());
    }

    let allowed = match level {
        AccessLevel::Owner => false,
        AccessLevel::Contributor => collaborations::is_collaborator_in(conn, &playlist.id, user_id)?,
    };
    if allowed {
        return Ok(());
    }

    warn!("User {} denied {:?} access to playlist {}", user_id, level, playlist.id);
    Err(match level {
        AccessLevel::Owner => ApiError::Forbidden("You are not the owner of this playlist"),
        AccessLevel::Contributor => {
            ApiError::Forbidden("You do not have permission to access this playlist")
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use openmusic_db::Database;
    use openmusic_db::queries::insert_user;

    fn seeded() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            for (id, name) in [("owner", "olivia"), ("collab", "carl"), ("stranger", "sam")] {
                insert_user(conn, id, name, "hash", name)?;
            }
            playlists::insert_playlist(conn, "playlist-1", "Focus", "owner")?;
            playlists::upsert_collaboration(conn, "collab-1", "playlist-1", "collab")?;
            Ok::<_, anyhow::Error>(())
        })
        .unwrap();
        db
    }

    fn check(db: &Database, user: &str, level: AccessLevel) -> ApiResult<()> {
        db.with_conn(|conn| {
            let playlist = load_playlist(conn, "playlist-1")?;
            authorize(conn, &playlist, user, level)
        })
    }

    #[test]
    fn permission_matrix() {
        let db = seeded();

        assert!(check(&db, "owner", AccessLevel::Owner).is_ok());
        assert!(check(&db, "owner", AccessLevel::Contributor).is_ok());

        assert!(matches!(check(&db, "collab", AccessLevel::Owner), Err(ApiError::Forbidden(_))));
        assert!(check(&db, "collab", AccessLevel::Contributor).is_ok());

        assert!(matches!(check(&db, "stranger", AccessLevel::Owner), Err(ApiError::Forbidden(_))));
        assert!(matches!(
            check(&db, "stranger", AccessLevel::Contributor),
            Err(ApiError::Forbidden(_))
        ));
    }

    #[test]
    fn missing_playlist_is_not_found() {
        let db = seeded();
        let result = db.with_conn(|conn| load_playlist(conn, "playlist-404").map(|_| ()));
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }
}
