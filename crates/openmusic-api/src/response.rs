use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use openmusic_types::envelope::Envelope;
use serde::Serialize;

/// Every handler outcome, rendered as an [`Envelope`] body.
#[derive(Debug)]
pub enum Reply<T> {
    Success {
        code: StatusCode,
        message: Option<String>,
        data: Option<T>,
    },
    Fail {
        code: StatusCode,
        message: String,
    },
    Error {
        code: StatusCode,
        message: String,
    },
}

impl<T> Reply<T> {
    pub fn ok(data: T) -> Self {
        Self::Success {
            code: StatusCode::OK,
            message: None,
            data: Some(data),
        }
    }

    pub fn created(data: T) -> Self {
        Self::Success {
            code: StatusCode::CREATED,
            message: None,
            data: Some(data),
        }
    }
}

impl Reply<()> {
    pub fn message(code: StatusCode, message: impl Into<String>) -> Self {
        Self::Success {
            code,
            message: Some(message.into()),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for Reply<T> {
    fn into_response(self) -> Response {
        match self {
            Self::Success {
                code,
                message,
                data,
            } => (code, Json(Envelope::success(message, data))).into_response(),
            Self::Fail { code, message } => (code, Json(Envelope::fail(message))).into_response(),
            Self::Error { code, message } => (code, Json(Envelope::error(message))).into_response(),
        }
    }
}
