use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;

use openmusic_types::api::{
    AlbumRequest, CollaborationRequest, CreatePlaylistRequest, LoginRequest, PlaylistSongRequest,
    RefreshTokenRequest, RegisterRequest, SongRequest,
};

use crate::error::ApiError;

/// Field-level checks run after a body deserializes.
pub trait Validate {
    fn validate(&self) -> Result<(), ApiError>;
}

/// JSON body extractor that rejects with the envelope instead of plain text.
pub struct Payload<T>(pub T);

impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate + Send,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| ApiError::Validation(rejection.body_text()))?;
        value.validate()?;
        Ok(Self(value))
    }
}

const YEARS: std::ops::RangeInclusive<i32> = 1900..=2100;

fn required(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!("\"{}\" is not allowed to be empty", field)));
    }
    Ok(())
}

fn year(value: i32) -> Result<(), ApiError> {
    if !YEARS.contains(&value) {
        return Err(ApiError::Validation(format!(
            "\"year\" must be between {} and {}",
            YEARS.start(),
            YEARS.end()
        )));
    }
    Ok(())
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if !(3..=50).contains(&self.username.chars().count()) {
            return Err(ApiError::Validation(
                "\"username\" must be between 3 and 50 characters".into(),
            ));
        }
        if self.password.chars().count() < 6 {
            return Err(ApiError::Validation(
                "\"password\" must be at least 6 characters".into(),
            ));
        }
        required("fullname", &self.fullname)
    }
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), ApiError> {
        required("username", &self.username)?;
        required("password", &self.password)
    }
}

impl Validate for RefreshTokenRequest {
    fn validate(&self) -> Result<(), ApiError> {
        required("refreshToken", &self.refresh_token)
    }
}

impl Validate for CollaborationRequest {
    fn validate(&self) -> Result<(), ApiError> {
        required("playlistId", &self.playlist_id)?;
        required("userId", &self.user_id)
    }
}

impl Validate for CreatePlaylistRequest {
    fn validate(&self) -> Result<(), ApiError> {
        required("name", &self.name)
    }
}

impl Validate for PlaylistSongRequest {
    fn validate(&self) -> Result<(), ApiError> {
        required("songId", &self.song_id)
    }
}

impl Validate for AlbumRequest {
    fn validate(&self) -> Result<(), ApiError> {
        required("name", &self.name)?;
        year(self.year)
    }
}

impl Validate for SongRequest {
    fn validate(&self) -> Result<(), ApiError> {
        required("title", &self.title)?;
        required("genre", &self.genre)?;
        required("performer", &self.performer)?;
        year(self.year)?;
        if matches!(self.duration, Some(d) if d < 0) {
            return Err(ApiError::Validation("\"duration\" must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_rejects_short_password() {
        let req = RegisterRequest {
            username: "alice".into(),
            password: "123".into(),
            fullname: "Alice".into(),
        };
        assert!(matches!(req.validate(), Err(ApiError::Validation(_))));
    }

    #[test]
    fn song_year_must_be_plausible() {
        let req = SongRequest {
            title: "Song".into(),
            year: 1200,
            genre: "Pop".into(),
            performer: "Someone".into(),
            duration: None,
            album_id: None,
        };
        assert!(req.validate().is_err());

        let req = SongRequest { year: 1999, ..req };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn blank_playlist_name_is_rejected() {
        let req = CreatePlaylistRequest { name: "   ".into() };
        assert!(req.validate().is_err());
    }
}
