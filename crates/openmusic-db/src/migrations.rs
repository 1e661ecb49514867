use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

const SCHEMA_V1: &str = "
    CREATE TABLE users (
        id          TEXT PRIMARY KEY,
        username    TEXT NOT NULL UNIQUE,
        password    TEXT NOT NULL,
        fullname    TEXT NOT NULL,
        created_at  TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE albums (
        id          TEXT PRIMARY KEY,
        name        TEXT NOT NULL,
        year        INTEGER NOT NULL,
        created_at  TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE songs (
        id          TEXT PRIMARY KEY,
        title       TEXT NOT NULL,
        year        INTEGER NOT NULL,
        genre       TEXT NOT NULL,
        performer   TEXT NOT NULL,
        duration    INTEGER,
        album_id    TEXT REFERENCES albums(id) ON DELETE SET NULL,
        created_at  TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE INDEX idx_songs_album ON songs(album_id);

    CREATE TABLE playlists (
        id          TEXT PRIMARY KEY,
        name        TEXT NOT NULL,
        owner       TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        created_at  TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE INDEX idx_playlists_owner ON playlists(owner);

    CREATE TABLE playlist_songs (
        id          TEXT PRIMARY KEY,
        playlist_id TEXT NOT NULL REFERENCES playlists(id) ON DELETE CASCADE,
        song_id     TEXT NOT NULL REFERENCES songs(id) ON DELETE CASCADE,
        UNIQUE(playlist_id, song_id)
    );

    CREATE TABLE collaborations (
        id          TEXT PRIMARY KEY,
        playlist_id TEXT NOT NULL REFERENCES playlists(id) ON DELETE CASCADE,
        user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        UNIQUE(playlist_id, user_id)
    );

    CREATE INDEX idx_collaborations_user ON collaborations(user_id);

    CREATE TABLE playlist_song_activities (
        id          TEXT PRIMARY KEY,
        playlist_id TEXT NOT NULL REFERENCES playlists(id) ON DELETE CASCADE,
        user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        song_id     TEXT REFERENCES songs(id) ON DELETE SET NULL,
        song_title  TEXT NOT NULL,
        action      TEXT NOT NULL CHECK (action IN ('add', 'remove')),
        time        TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
    );

    CREATE INDEX idx_activities_playlist
        ON playlist_song_activities(playlist_id, time);

    CREATE TABLE refresh_tokens (
        token       TEXT PRIMARY KEY,
        user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        expires_at  INTEGER NOT NULL,
        created_at  TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE INDEX idx_refresh_tokens_user ON refresh_tokens(user_id);
";

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(&format!(
            "BEGIN;
            {}
            INSERT INTO schema_version (version) VALUES (1);
            COMMIT;",
            SCHEMA_V1
        ))?;
    }

    info!("Database migrations complete");
    Ok(())
}
