use crate::OptionalExt;
use crate::catalog::map_song_summary;
use crate::models::{ActivityRow, PlaylistRow, PlaylistSummaryRow, SongSummaryRow};
use anyhow::Result;
use openmusic_types::models::ActivityAction;
use rusqlite::Connection;

// -- Playlists --

pub fn insert_playlist(conn: &Connection, id: &str, name: &str, owner: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO playlists (id, name, owner) VALUES (?1, ?2, ?3)",
        (id, name, owner),
    )?;
    Ok(())
}

pub fn playlist_by_id(conn: &Connection, id: &str) -> Result<Option<PlaylistRow>> {
    conn.query_row(
        "SELECT id, name, owner FROM playlists WHERE id = ?1",
        [id],
        |row| {
            Ok(PlaylistRow {
                id: row.get(0)?,
                name: row.get(1)?,
                owner: row.get(2)?,
            })
        },
    )
    .optional()
}

/// Playlists the user owns or collaborates on, with the owner's username.
pub fn playlists_visible_to(conn: &Connection, user_id: &str) -> Result<Vec<PlaylistSummaryRow>> {
    let mut stmt = conn.prepare(
        "SELECT p.id, p.name, u.username
         FROM playlists p
         JOIN users u ON p.owner = u.id
         WHERE p.owner = ?1
            OR p.id IN (SELECT playlist_id FROM collaborations WHERE user_id = ?1)
         ORDER BY p.created_at, p.rowid",
    )?;

    let rows = stmt
        .query_map([user_id], |row| {
            Ok(PlaylistSummaryRow {
                id: row.get(0)?,
                name: row.get(1)?,
                username: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Collaborations, memberships and activity rows go with it (ON DELETE CASCADE).
pub fn delete_playlist(conn: &Connection, id: &str) -> Result<usize> {
    let removed = conn.execute("DELETE FROM playlists WHERE id = ?1", [id])?;
    Ok(removed)
}

// -- Membership --

/// Returns false when the song was already a member.
pub fn insert_playlist_song(
    conn: &Connection,
    id: &str,
    playlist_id: &str,
    song_id: &str,
) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO playlist_songs (id, playlist_id, song_id) VALUES (?1, ?2, ?3)",
        (id, playlist_id, song_id),
    )?;
    Ok(inserted == 1)
}

pub fn delete_playlist_song(conn: &Connection, playlist_id: &str, song_id: &str) -> Result<usize> {
    let removed = conn.execute(
        "DELETE FROM playlist_songs WHERE playlist_id = ?1 AND song_id = ?2",
        (playlist_id, song_id),
    )?;
    Ok(removed)
}

pub fn songs_in_playlist(conn: &Connection, playlist_id: &str) -> Result<Vec<SongSummaryRow>> {
    let mut stmt = conn.prepare(
        "SELECT s.id, s.title, s.performer
         FROM songs s
         JOIN playlist_songs ps ON s.id = ps.song_id
         WHERE ps.playlist_id = ?1
         ORDER BY ps.rowid",
    )?;

    let rows = stmt
        .query_map([playlist_id], map_song_summary)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

// -- Collaborations --

pub fn collaboration_exists(conn: &Connection, playlist_id: &str, user_id: &str) -> Result<bool> {
    Ok(collaboration_id(conn, playlist_id, user_id)?.is_some())
}

pub fn collaboration_id(
    conn: &Connection,
    playlist_id: &str,
    user_id: &str,
) -> Result<Option<String>> {
    conn.query_row(
        "SELECT id FROM collaborations WHERE playlist_id = ?1 AND user_id = ?2",
        (playlist_id, user_id),
        |row| row.get(0),
    )
    .optional()
}

/// Insert-or-noop on (playlist, user). Returns the id of the grant that is
/// in place afterwards, which is the existing one for a repeated grant.
pub fn upsert_collaboration(
    conn: &Connection,
    id: &str,
    playlist_id: &str,
    user_id: &str,
) -> Result<String> {
    conn.execute(
        "INSERT OR IGNORE INTO collaborations (id, playlist_id, user_id) VALUES (?1, ?2, ?3)",
        (id, playlist_id, user_id),
    )?;

    collaboration_id(conn, playlist_id, user_id)?
        .ok_or_else(|| anyhow::anyhow!("collaboration vanished after insert"))
}

pub fn delete_collaboration(conn: &Connection, playlist_id: &str, user_id: &str) -> Result<usize> {
    let removed = conn.execute(
        "DELETE FROM collaborations WHERE playlist_id = ?1 AND user_id = ?2",
        (playlist_id, user_id),
    )?;
    Ok(removed)
}

pub fn count_collaborations(conn: &Connection, playlist_id: &str) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM collaborations WHERE playlist_id = ?1",
        [playlist_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

// -- Activities --

/// Copies the song title onto the row, so the entry outlives the song.
pub fn insert_activity(
    conn: &Connection,
    id: &str,
    playlist_id: &str,
    user_id: &str,
    song_id: &str,
    action: ActivityAction,
) -> Result<()> {
    let inserted = conn.execute(
        "INSERT INTO playlist_song_activities (id, playlist_id, user_id, song_id, song_title, action)
         SELECT ?1, ?2, ?3, s.id, s.title, ?5 FROM songs s WHERE s.id = ?4",
        (id, playlist_id, user_id, song_id, action.as_str()),
    )?;
    if inserted == 0 {
        anyhow::bail!("activity for unknown song {}", song_id);
    }
    Ok(())
}

/// Oldest first; rows stamped within the same millisecond keep insertion order.
pub fn activities_for_playlist(conn: &Connection, playlist_id: &str) -> Result<Vec<ActivityRow>> {
    let mut stmt = conn.prepare(
        "SELECT u.username, a.song_title, a.action, a.time
         FROM playlist_song_activities a
         JOIN users u ON a.user_id = u.id
         WHERE a.playlist_id = ?1
         ORDER BY a.time ASC, a.rowid ASC",
    )?;

    let rows = stmt
        .query_map([playlist_id], |row| {
            Ok(ActivityRow {
                username: row.get(0)?,
                title: row.get(1)?,
                action: row.get(2)?,
                time: row.get(3)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use crate::catalog::insert_song;
    use crate::models::SongRow;
    use crate::queries::insert_user;

    fn seeded() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            insert_user(conn, "user-a", "alice", "hash", "Alice")?;
            insert_user(conn, "user-b", "bob", "hash", "Bob")?;
            insert_song(
                conn,
                &SongRow {
                    id: "song-1".into(),
                    title: "Bohemian Rhapsody".into(),
                    year: 1975,
                    genre: "Rock".into(),
                    performer: "Queen".into(),
                    duration: None,
                    album_id: None,
                },
            )?;
            insert_playlist(conn, "playlist-1", "Roadtrip", "user-a")
        })
        .unwrap();
        db
    }

    #[test]
    fn repeated_grant_keeps_a_single_row() {
        let db = seeded();
        let (first, second) = db
            .with_conn(|conn| {
                let first = upsert_collaboration(conn, "collab-1", "playlist-1", "user-b")?;
                let second = upsert_collaboration(conn, "collab-2", "playlist-1", "user-b")?;
                Ok::<_, anyhow::Error>((first, second))
            })
            .unwrap();

        assert_eq!(first, "collab-1");
        assert_eq!(second, "collab-1");
        assert_eq!(db.with_conn(|conn| count_collaborations(conn, "playlist-1")).unwrap(), 1);
    }

    #[test]
    fn collaborator_sees_playlist_in_listing() {
        let db = seeded();
        db.with_conn(|conn| upsert_collaboration(conn, "collab-1", "playlist-1", "user-b"))
            .unwrap();

        let visible = db.with_conn(|conn| playlists_visible_to(conn, "user-b")).unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].username, "alice");
    }

    #[test]
    fn deleting_playlist_cascades() {
        let db = seeded();
        db.with_conn(|conn| {
            upsert_collaboration(conn, "collab-1", "playlist-1", "user-b")?;
            insert_playlist_song(conn, "ps-1", "playlist-1", "song-1")?;
            insert_activity(conn, "act-1", "playlist-1", "user-a", "song-1", ActivityAction::Add)?;
            delete_playlist(conn, "playlist-1")
        })
        .unwrap();

        db.with_conn(|conn| {
            assert_eq!(count_collaborations(conn, "playlist-1")?, 0);
            assert!(songs_in_playlist(conn, "playlist-1")?.is_empty());
            assert!(activities_for_playlist(conn, "playlist-1")?.is_empty());
            Ok::<_, anyhow::Error>(())
        })
        .unwrap();
    }

    #[test]
    fn activity_survives_song_deletion() {
        let db = seeded();
        db.with_conn(|conn| {
            insert_activity(conn, "act-1", "playlist-1", "user-a", "song-1", ActivityAction::Add)?;
            insert_activity(conn, "act-2", "playlist-1", "user-a", "song-1", ActivityAction::Remove)?;
            crate::catalog::delete_song(conn, "song-1")
        })
        .unwrap();

        let log = db.with_conn(|conn| activities_for_playlist(conn, "playlist-1")).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].title, "Bohemian Rhapsody");
        assert_eq!(log[1].action, "remove");

        let dangling: Option<String> = db
            .with_conn(|conn| {
                conn.query_row(
                    "SELECT song_id FROM playlist_song_activities WHERE id = 'act-1'",
                    [],
                    |r| r.get(0),
                )
                .map_err(anyhow::Error::from)
            })
            .unwrap();
        assert!(dangling.is_none());
    }

    #[test]
    fn activity_for_unknown_song_is_refused() {
        let db = seeded();
        let result = db.with_conn(|conn| {
            insert_activity(conn, "act-1", "playlist-1", "user-a", "song-404", ActivityAction::Add)
        });
        assert!(result.is_err());
    }

    #[test]
    fn membership_is_a_set() {
        let db = seeded();
        let (first, again) = db
            .with_conn(|conn| {
                let first = insert_playlist_song(conn, "ps-1", "playlist-1", "song-1")?;
                let again = insert_playlist_song(conn, "ps-2", "playlist-1", "song-1")?;
                Ok::<_, anyhow::Error>((first, again))
            })
            .unwrap();

        assert!(first);
        assert!(!again);
        assert_eq!(db.with_conn(|conn| songs_in_playlist(conn, "playlist-1")).unwrap().len(), 1);
    }
}
