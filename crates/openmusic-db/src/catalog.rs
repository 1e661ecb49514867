use crate::OptionalExt;
use crate::models::{AlbumRow, SongRow, SongSummaryRow};
use anyhow::Result;
use rusqlite::Connection;

// -- Albums --

pub fn insert_album(conn: &Connection, id: &str, name: &str, year: i32) -> Result<()> {
    conn.execute(
        "INSERT INTO albums (id, name, year) VALUES (?1, ?2, ?3)",
        rusqlite::params![id, name, year],
    )?;
    Ok(())
}

pub fn album_by_id(conn: &Connection, id: &str) -> Result<Option<AlbumRow>> {
    conn.query_row(
        "SELECT id, name, year FROM albums WHERE id = ?1",
        [id],
        |row| {
            Ok(AlbumRow {
                id: row.get(0)?,
                name: row.get(1)?,
                year: row.get(2)?,
            })
        },
    )
    .optional()
}

/// Returns the number of rows changed (0 when the album does not exist).
pub fn update_album(conn: &Connection, id: &str, name: &str, year: i32) -> Result<usize> {
    let changed = conn.execute(
        "UPDATE albums SET name = ?1, year = ?2 WHERE id = ?3",
        rusqlite::params![name, year, id],
    )?;
    Ok(changed)
}

pub fn delete_album(conn: &Connection, id: &str) -> Result<usize> {
    let removed = conn.execute("DELETE FROM albums WHERE id = ?1", [id])?;
    Ok(removed)
}

pub fn songs_in_album(conn: &Connection, album_id: &str) -> Result<Vec<SongSummaryRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, performer FROM songs WHERE album_id = ?1 ORDER BY created_at, rowid",
    )?;

    let rows = stmt
        .query_map([album_id], map_song_summary)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

// -- Songs --

pub fn insert_song(conn: &Connection, song: &SongRow) -> Result<()> {
    conn.execute(
        "INSERT INTO songs (id, title, year, genre, performer, duration, album_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            song.id,
            song.title,
            song.year,
            song.genre,
            song.performer,
            song.duration,
            song.album_id,
        ],
    )?;
    Ok(())
}

pub fn song_by_id(conn: &Connection, id: &str) -> Result<Option<SongRow>> {
    conn.query_row(
        "SELECT id, title, year, genre, performer, duration, album_id FROM songs WHERE id = ?1",
        [id],
        |row| {
            Ok(SongRow {
                id: row.get(0)?,
                title: row.get(1)?,
                year: row.get(2)?,
                genre: row.get(3)?,
                performer: row.get(4)?,
                duration: row.get(5)?,
                album_id: row.get(6)?,
            })
        },
    )
    .optional()
}

pub fn song_exists(conn: &Connection, id: &str) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row("SELECT 1 FROM songs WHERE id = ?1", [id], |row| row.get(0))
        .optional()?;
    Ok(found.is_some())
}

/// Updates every column except the id; returns the number of rows changed.
pub fn update_song(conn: &Connection, song: &SongRow) -> Result<usize> {
    let changed = conn.execute(
        "UPDATE songs
         SET title = ?1, year = ?2, genre = ?3, performer = ?4, duration = ?5, album_id = ?6
         WHERE id = ?7",
        rusqlite::params![
            song.title,
            song.year,
            song.genre,
            song.performer,
            song.duration,
            song.album_id,
            song.id,
        ],
    )?;
    Ok(changed)
}

pub fn delete_song(conn: &Connection, id: &str) -> Result<usize> {
    let removed = conn.execute("DELETE FROM songs WHERE id = ?1", [id])?;
    Ok(removed)
}

/// Case-insensitive substring search; `None` filters match everything.
pub fn search_songs(
    conn: &Connection,
    title: Option<&str>,
    performer: Option<&str>,
) -> Result<Vec<SongSummaryRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, performer FROM songs
         WHERE (?1 IS NULL OR title LIKE '%' || ?1 || '%')
           AND (?2 IS NULL OR performer LIKE '%' || ?2 || '%')
         ORDER BY created_at, rowid",
    )?;

    let rows = stmt
        .query_map(rusqlite::params![title, performer], map_song_summary)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

pub(crate) fn map_song_summary(row: &rusqlite::Row<'_>) -> rusqlite::Result<SongSummaryRow> {
    Ok(SongSummaryRow {
        id: row.get(0)?,
        title: row.get(1)?,
        performer: row.get(2)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    fn song(id: &str, title: &str, performer: &str, album_id: Option<&str>) -> SongRow {
        SongRow {
            id: id.into(),
            title: title.into(),
            year: 2008,
            genre: "Indie".into(),
            performer: performer.into(),
            duration: Some(240),
            album_id: album_id.map(String::from),
        }
    }

    #[test]
    fn search_is_case_insensitive_and_combinable() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            insert_song(conn, &song("song-1", "Fearless", "Taylor Swift", None))?;
            insert_song(conn, &song("song-2", "Fear of the Dark", "Iron Maiden", None))?;
            insert_song(conn, &song("song-3", "Love Story", "Taylor Swift", None))
        })
        .unwrap();

        let hits = db.with_conn(|conn| search_songs(conn, Some("fear"), None)).unwrap();
        assert_eq!(hits.len(), 2);

        let hits = db
            .with_conn(|conn| search_songs(conn, Some("fear"), Some("taylor")))
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "song-1");

        let all = db.with_conn(|conn| search_songs(conn, None, None)).unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn deleting_an_album_detaches_its_songs() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            insert_album(conn, "album-1", "Viva la Vida", 2008)?;
            insert_song(conn, &song("song-1", "Viva la Vida", "Coldplay", Some("album-1")))
        })
        .unwrap();

        let listed = db.with_conn(|conn| songs_in_album(conn, "album-1")).unwrap();
        assert_eq!(listed.len(), 1);

        assert_eq!(db.with_conn(|conn| delete_album(conn, "album-1")).unwrap(), 1);
        let orphan = db.with_conn(|conn| song_by_id(conn, "song-1")).unwrap().unwrap();
        assert!(orphan.album_id.is_none());
    }
}
