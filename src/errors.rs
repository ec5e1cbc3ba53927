use crate::{models::key::KeyError, services::object_store::StoreError};
use axum::{
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use std::fmt;
use tracing::{error, warn};

/// A lightweight error carrying the status and the text the caller sees.
///
/// The message is always one of the short generic bodies below; backend
/// detail is logged where the error is converted and never stored here.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: &'static str,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: &'static str) -> Self {
        Self {
            status,
            message: msg,
        }
    }

    /// 400: malformed or traversal-attempting key
    pub fn bad_key() -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad key")
    }

    /// 403: key outside the allowed prefix
    pub fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN, "forbidden")
    }

    /// Shortcut for 404 Not Found
    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "not found")
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "server error")
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (
            self.status,
            [(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            )],
            self.message,
        )
            .into_response()
    }
}

impl From<KeyError> for AppError {
    fn from(err: KeyError) -> Self {
        match err {
            KeyError::Traversal | KeyError::Absolute => AppError::bad_key(),
            KeyError::OutsidePrefix => AppError::forbidden(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ObjectNotFound { .. } => AppError::not_found(),
            StoreError::Timeout(_) => {
                warn!("{}", err);
                AppError::internal()
            }
            StoreError::Backend(_) => {
                error!("{}", err);
                AppError::internal()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn taxonomy_maps_to_status_codes() {
        assert_eq!(AppError::from(KeyError::Traversal).status, StatusCode::BAD_REQUEST);
        assert_eq!(AppError::from(KeyError::Absolute).status, StatusCode::BAD_REQUEST);
        assert_eq!(AppError::from(KeyError::OutsidePrefix).status, StatusCode::FORBIDDEN);

        let missing = StoreError::ObjectNotFound {
            bucket: "media".into(),
            key: "love/x.jpg".into(),
        };
        assert_eq!(AppError::from(missing).status, StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::from(StoreError::Timeout(Duration::from_secs(1))).status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn backend_detail_is_not_kept() {
        let err = AppError::from(StoreError::Backend("AccessDenied on bucket media".into()));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "server error");
    }
}
