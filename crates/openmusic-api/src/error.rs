use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::response::Reply;

pub type ApiResult<T> = Result<T, ApiError>;

pub const INTERNAL_MESSAGE: &str = "An internal server error occurred";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error("{0}")]
    Conflict(&'static str),
    #[error("Invalid refresh token")]
    InvalidToken,
    #[error("Refresh token has expired")]
    ExpiredToken,
    #[error("internal error: {0:#}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Conflict(_) | Self::InvalidToken | Self::ExpiredToken => {
                StatusCode::BAD_REQUEST
            }
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Internal(value.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.status_code();
        let reply = match self {
            Self::Internal(e) => {
                error!("{:#}", e);
                Reply::<()>::Error {
                    code,
                    message: INTERNAL_MESSAGE.to_string(),
                }
            }
            e => Reply::Fail {
                code,
                message: e.to_string(),
            },
        };
        reply.into_response()
    }
}
