use chrono::{DateTime, Utc};
use rusqlite::Connection;

use openmusic_db::playlists;
use openmusic_types::api::ActivityEntry;
use openmusic_types::models::ActivityAction;

use crate::error::ApiResult;
use crate::users::new_id;

/// Appends one immutable activity row. Runs on the caller's connection so
/// the entry commits or rolls back together with the membership change.
pub fn record(
    conn: &Connection,
    playlist_id: &str,
    acting_user_id: &str,
    song_id: &str,
    action: ActivityAction,
) -> ApiResult<()> {
    playlists::insert_activity(
        conn,
        &new_id("playlist-activity"),
        playlist_id,
        acting_user_id,
        song_id,
        action,
    )?;
    Ok(())
}

/// Oldest first.
pub fn list_for_playlist(conn: &Connection, playlist_id: &str) -> ApiResult<Vec<ActivityEntry>> {
    let rows = playlists::activities_for_playlist(conn, playlist_id)?;

    let mut entries = Vec::with_capacity(rows.len());
    for row in rows {
        let action = row
            .action
            .parse::<ActivityAction>()
            .map_err(|e| anyhow::anyhow!("corrupt activity row: {}", e))?;

        entries.push(ActivityEntry {
            username: row.username,
            title: row.title,
            action,
            time: parse_time(&row.time)?,
        });
    }

    Ok(entries)
}

fn parse_time(raw: &str) -> anyhow::Result<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>()
        .map_err(|e| anyhow::anyhow!("corrupt activity time '{}': {}", raw, e))
}
