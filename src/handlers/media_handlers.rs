//! HTTP handler for `GET /media/{*path}`.
//! Streams object bodies to avoid buffering in memory and delegates storage
//! concerns to `MediaService`.

use crate::{errors::AppError, models::object::StoredObject, services::media_service::MediaService};
use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::Response,
};
use chrono::{DateTime, Utc};
use tracing::debug;

/// Browsers revalidate every navigation; shared caches keep it for a year.
pub const CACHE_POLICY: &str = "public, max-age=0, s-maxage=31536000, immutable";

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Download `/media/{*path}` as a streaming response.
///
/// The key is validated and authorized before the store is contacted, so
/// rejected paths never reveal whether an object exists.
pub async fn get_media(
    State(service): State<MediaService>,
    Path(path): Path<String>,
) -> Result<Response, AppError> {
    let key = service.authorize(&path).inspect_err(|err| {
        debug!("rejected media path `{}`: {}", path, err);
    })?;

    let object = service.fetch(&key).await?;

    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::OK;
    set_object_headers(response.headers_mut(), &object);
    *response.body_mut() = Body::from_stream(object.body);

    Ok(response)
}

fn set_object_headers(headers: &mut HeaderMap, object: &StoredObject) {
    let content_type = object
        .content_type
        .as_deref()
        .and_then(|v| HeaderValue::from_str(v).ok())
        .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
    headers.insert(header::CONTENT_TYPE, content_type);

    if let Some(length) = object.content_length {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    }

    if let Some(etag) = object.etag.as_deref() {
        if let Ok(value) = HeaderValue::from_str(etag) {
            headers.insert(header::ETAG, value);
        }
    }

    if let Some(modified) = object.last_modified {
        if let Ok(value) = HeaderValue::from_str(&http_date(modified)) {
            headers.insert(header::LAST_MODIFIED, value);
        }
    }

    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(CACHE_POLICY),
    );
}

/// IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
