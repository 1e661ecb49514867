use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::ActivityAction;

// -- Users & authentications --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub fullname: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
}

/// Body of `PUT /authentications` and `DELETE /authentications`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    pub access_token: String,
}

// -- Collaborations --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CollaborationRequest {
    pub playlist_id: String,
    pub user_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollaborationResponse {
    pub collaboration_id: String,
}

// -- Playlists --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreatePlaylistRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistCreated {
    pub playlist_id: String,
}

/// One row of `GET /playlists`; `username` is the owner's.
#[derive(Debug, Clone, Serialize)]
pub struct PlaylistSummary {
    pub id: String,
    pub name: String,
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct PlaylistList {
    pub playlists: Vec<PlaylistSummary>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PlaylistSongRequest {
    pub song_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlaylistDetail {
    pub id: String,
    pub name: String,
    pub username: String,
    pub songs: Vec<SongSummary>,
}

#[derive(Debug, Serialize)]
pub struct PlaylistDetailResponse {
    pub playlist: PlaylistDetail,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityEntry {
    pub username: String,
    pub title: String,
    pub action: ActivityAction,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistActivities {
    pub playlist_id: String,
    pub activities: Vec<ActivityEntry>,
}

// -- Albums & songs --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AlbumRequest {
    pub name: String,
    pub year: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumCreated {
    pub album_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Album {
    pub id: String,
    pub name: String,
    pub year: i32,
    pub songs: Vec<SongSummary>,
}

#[derive(Debug, Serialize)]
pub struct AlbumResponse {
    pub album: Album,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SongRequest {
    pub title: String,
    pub year: i32,
    pub genre: String,
    pub performer: String,
    pub duration: Option<i32>,
    pub album_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SongCreated {
    pub song_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SongSummary {
    pub id: String,
    pub title: String,
    pub performer: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub id: String,
    pub title: String,
    pub year: i32,
    pub genre: String,
    pub performer: String,
    pub duration: Option<i32>,
    pub album_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SongResponse {
    pub song: Song,
}

#[derive(Debug, Serialize)]
pub struct SongList {
    pub songs: Vec<SongSummary>,
}

/// Optional filters for `GET /songs`.
#[derive(Debug, Default, Deserialize)]
pub struct SongQuery {
    pub title: Option<String>,
    pub performer: Option<String>,
}
