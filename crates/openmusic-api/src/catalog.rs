use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
};

use openmusic_db::models::{SongRow, SongSummaryRow};
use openmusic_db::{Database, catalog};
use openmusic_types::api::{
    Album, AlbumCreated, AlbumRequest, AlbumResponse, Song, SongCreated, SongList, SongQuery,
    SongRequest, SongResponse, SongSummary,
};

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};
use crate::extract::Payload;
use crate::response::Reply;
use crate::run_blocking;
use crate::users::new_id;

/// Plain album/song storage; no ownership rules apply here.
pub struct Catalog {
    db: Arc<Database>,
}

impl Catalog {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn create_album(&self, req: &AlbumRequest) -> ApiResult<String> {
        let id = new_id("album");
        self.db
            .with_conn(|conn| catalog::insert_album(conn, &id, &req.name, req.year))?;
        Ok(id)
    }

    pub fn album(&self, id: &str) -> ApiResult<Album> {
        self.db.with_conn(|conn| {
            let album = catalog::album_by_id(conn, id)?.ok_or(ApiError::NotFound("Album not found"))?;
            let songs = catalog::songs_in_album(conn, id)?;
            Ok(Album {
                id: album.id,
                name: album.name,
                year: album.year,
                songs: songs.into_iter().map(summary).collect(),
            })
        })
    }

    pub fn update_album(&self, id: &str, req: &AlbumRequest) -> ApiResult<()> {
        let changed = self
            .db
            .with_conn(|conn| catalog::update_album(conn, id, &req.name, req.year))?;
        if changed == 0 {
            return Err(ApiError::NotFound("Album not found"));
        }
        Ok(())
    }

    pub fn delete_album(&self, id: &str) -> ApiResult<()> {
        if self.db.with_conn(|conn| catalog::delete_album(conn, id))? == 0 {
            return Err(ApiError::NotFound("Album not found"));
        }
        Ok(())
    }

    pub fn create_song(&self, req: SongRequest) -> ApiResult<String> {
        let song = song_row(new_id("song"), req);
        self.db.with_tx(|tx| {
            check_album(tx, song.album_id.as_deref())?;
            catalog::insert_song(tx, &song)?;
            Ok::<_, ApiError>(())
        })?;
        Ok(song.id)
    }

    pub fn song(&self, id: &str) -> ApiResult<Song> {
        let row = self
            .db
            .with_conn(|conn| catalog::song_by_id(conn, id))?
            .ok_or(ApiError::NotFound("Song not found"))?;

        Ok(Song {
            id: row.id,
            title: row.title,
            year: row.year,
            genre: row.genre,
            performer: row.performer,
            duration: row.duration,
            album_id: row.album_id,
        })
    }

    pub fn search_songs(&self, query: &SongQuery) -> ApiResult<Vec<SongSummary>> {
        let rows = self.db.with_conn(|conn| {
            catalog::search_songs(conn, query.title.as_deref(), query.performer.as_deref())
        })?;
        Ok(rows.into_iter().map(summary).collect())
    }

    pub fn update_song(&self, id: &str, req: SongRequest) -> ApiResult<()> {
        let song = song_row(id.to_string(), req);
        self.db.with_tx(|tx| {
            check_album(tx, song.album_id.as_deref())?;
            if catalog::update_song(tx, &song)? == 0 {
                return Err(ApiError::NotFound("Song not found"));
            }
            Ok(())
        })
    }

    pub fn delete_song(&self, id: &str) -> ApiResult<()> {
        if self.db.with_conn(|conn| catalog::delete_song(conn, id))? == 0 {
            return Err(ApiError::NotFound("Song not found"));
        }
        Ok(())
    }
}

fn check_album(conn: &rusqlite::Connection, album_id: Option<&str>) -> ApiResult<()> {
    if let Some(album_id) = album_id {
        if catalog::album_by_id(conn, album_id)?.is_none() {
            return Err(ApiError::NotFound("Album not found"));
        }
    }
    Ok(())
}

fn song_row(id: String, req: SongRequest) -> SongRow {
    SongRow {
        id,
        title: req.title,
        year: req.year,
        genre: req.genre,
        performer: req.performer,
        duration: req.duration,
        album_id: req.album_id,
    }
}

fn summary(row: SongSummaryRow) -> SongSummary {
    SongSummary {
        id: row.id,
        title: row.title,
        performer: row.performer,
    }
}

// -- Handlers --

pub async fn create_album(
    State(state): State<AppState>,
    Payload(req): Payload<AlbumRequest>,
) -> ApiResult<Reply<AlbumCreated>> {
    let album_id = run_blocking(move || state.catalog.create_album(&req)).await?;
    Ok(Reply::created(AlbumCreated { album_id }))
}

pub async fn get_album(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Reply<AlbumResponse>> {
    let album = run_blocking(move || state.catalog.album(&id)).await?;
    Ok(Reply::ok(AlbumResponse { album }))
}

pub async fn update_album(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Payload(req): Payload<AlbumRequest>,
) -> ApiResult<Reply<()>> {
    run_blocking(move || state.catalog.update_album(&id, &req)).await?;
    Ok(Reply::message(StatusCode::OK, "Album updated successfully"))
}

pub async fn delete_album(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Reply<()>> {
    run_blocking(move || state.catalog.delete_album(&id)).await?;
    Ok(Reply::message(StatusCode::OK, "Album deleted successfully"))
}

pub async fn create_song(
    State(state): State<AppState>,
    Payload(req): Payload<SongRequest>,
) -> ApiResult<Reply<SongCreated>> {
    let song_id = run_blocking(move || state.catalog.create_song(req)).await?;
    Ok(Reply::created(SongCreated { song_id }))
}

pub async fn get_songs(
    State(state): State<AppState>,
    Query(query): Query<SongQuery>,
) -> ApiResult<Reply<SongList>> {
    let songs = run_blocking(move || state.catalog.search_songs(&query)).await?;
    Ok(Reply::ok(SongList { songs }))
}

pub async fn get_song(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Reply<SongResponse>> {
    let song = run_blocking(move || state.catalog.song(&id)).await?;
    Ok(Reply::ok(SongResponse { song }))
}

pub async fn update_song(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Payload(req): Payload<SongRequest>,
) -> ApiResult<Reply<()>> {
    run_blocking(move || state.catalog.update_song(&id, req)).await?;
    Ok(Reply::message(StatusCode::OK, "Song updated successfully"))
}

pub async fn delete_song(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Reply<()>> {
    run_blocking(move || state.catalog.delete_song(&id)).await?;
    Ok(Reply::message(StatusCode::OK, "Song deleted successfully"))
}
