use serde::Serialize;

/// Outcome class carried in every response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Request handled.
    Success,
    /// Client-caused failure (4xx).
    Fail,
    /// Unexpected server failure (5xx).
    Error,
}

/// JSON body shared by every endpoint: `{ status, message?, data? }`.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn success(message: Option<String>, data: Option<T>) -> Self {
        Self {
            status: Status::Success,
            message,
            data,
        }
    }
}

impl Envelope<()> {
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            status: Status::Fail,
            message: Some(message.into()),
            data: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            message: Some(message.into()),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_fields_are_omitted() {
        let body = serde_json::to_value(Envelope::fail("Playlist not found")).unwrap();
        assert_eq!(body, json!({ "status": "fail", "message": "Playlist not found" }));

        let body = serde_json::to_value(Envelope::success(None, Some(json!({ "songId": "song-1" })))).unwrap();
        assert_eq!(body, json!({ "status": "success", "data": { "songId": "song-1" } }));
    }
}
