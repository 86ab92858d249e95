use lambda_http::http::StatusCode;
use thiserror::Error;

use crate::store::StoreError;

/// Everything a handler can fail with. The middleware turns these into
/// responses; handlers never build error responses themselves.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing caller identity header {0}")]
    Unauthorized(&'static str),
    #[error("invalid request body: {0}")]
    InvalidBody(String),
    #[error("invalid {name}: {value:?}")]
    InvalidParam { name: &'static str, value: String },
    #[error("request item is missing {0}")]
    MissingField(&'static str),
    #[error("note {note_id} no longer matches version {ts}")]
    Conflict { note_id: String, ts: i64 },
    #[error("no route for {method} {path}")]
    NoRoute { method: String, path: String },
    #[error("storage: {0}")]
    Store(#[from] StoreError),
    #[error("encoding response: {0}")]
    Encode(#[source] serde_json::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::InvalidBody(_)
            | ApiError::InvalidParam { .. }
            | ApiError::MissingField(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::NoRoute { .. } => StatusCode::NOT_FOUND,
            ApiError::Store(_) | ApiError::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::InvalidBody(_)
            | ApiError::InvalidParam { .. }
            | ApiError::MissingField(_) => "bad_request",
            ApiError::Conflict { .. } => "conflict",
            ApiError::NoRoute { .. } => "not_found",
            ApiError::Store(_) | ApiError::Encode(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflicts_are_not_server_errors() {
        let e = ApiError::Conflict {
            note_id: "u1:x".into(),
            ts: 7,
        };
        assert_eq!(e.status(), StatusCode::CONFLICT);
        assert_eq!(e.code(), "conflict");
    }

    #[test]
    fn storage_failures_are_internal() {
        let e = ApiError::from(StoreError::ConditionFailed);
        assert_eq!(e.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(e.code(), "internal");
    }
}
