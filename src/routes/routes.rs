//! Defines routes for the media proxy.
//!
//! ## Structure
//! - `GET /healthz`        — liveness
//! - `GET /readyz`         — readiness (backing bucket reachable)
//! - `GET /media/{*path}`  — stream an object from the allowed prefix
//!
//! The wildcard `*path` allows nested keys like `love/era1/IMG_1949.JPG`.
//! Any other method on `/media/...` gets a 405 from the method router.

use crate::{
    handlers::{
        health_handlers::{healthz, readyz},
        media_handlers::get_media,
    },
    services::media_service::MediaService,
};
use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

/// Build and return the router. Handlers share `MediaService` as state.
pub fn routes() -> Router<MediaService> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/media/{*path}", get(get_media))
        .layer(TraceLayer::new_for_http())
}
