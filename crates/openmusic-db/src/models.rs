//! Database row types. These map directly to SQLite rows and stay
//! independent of the wire types in openmusic-types.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
    pub fullname: String,
}

pub struct RefreshTokenRow {
    pub token: String,
    pub user_id: String,
    pub expires_at: i64,
}

pub struct AlbumRow {
    pub id: String,
    pub name: String,
    pub year: i32,
}

pub struct SongRow {
    pub id: String,
    pub title: String,
    pub year: i32,
    pub genre: String,
    pub performer: String,
    pub duration: Option<i32>,
    pub album_id: Option<String>,
}

pub struct SongSummaryRow {
    pub id: String,
    pub title: String,
    pub performer: String,
}

#[derive(Debug, Clone)]
pub struct PlaylistRow {
    pub id: String,
    pub name: String,
    pub owner: String,
}

/// A playlist joined with its owner's username.
pub struct PlaylistSummaryRow {
    pub id: String,
    pub name: String,
    pub username: String,
}

pub struct ActivityRow {
    pub username: String,
    pub title: String,
    pub action: String,
    pub time: String,
}
