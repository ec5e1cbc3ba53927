//! MediaService: validate → authorize → fetch.
//!
//! Holds only read-only configuration and a handle to the shared store, so
//! clones are cheap and concurrent requests never contend on anything.

use crate::{
    config::AppConfig,
    models::{
        key::{KeyError, ObjectKey},
        object::StoredObject,
    },
    services::object_store::{ObjectStore, StoreError, StoreResult},
};
use std::{sync::Arc, time::Duration};
use tokio::time::timeout;
use tracing::debug;

#[derive(Clone)]
pub struct MediaService {
    store: Arc<dyn ObjectStore>,
    bucket: Arc<str>,
    allowed_prefix: Arc<str>,
    fetch_timeout: Duration,
}

impl MediaService {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        bucket: impl Into<Arc<str>>,
        allowed_prefix: impl Into<Arc<str>>,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            allowed_prefix: allowed_prefix.into(),
            fetch_timeout,
        }
    }

    pub fn from_config(store: Arc<dyn ObjectStore>, cfg: &AppConfig) -> Self {
        Self::new(
            store,
            cfg.bucket.as_str(),
            cfg.allowed_prefix.as_str(),
            cfg.fetch_timeout,
        )
    }

    /// Turn the captured path into an authorized key. Never touches the store.
    pub fn authorize(&self, path: &str) -> Result<ObjectKey, KeyError> {
        ObjectKey::from_segments(path.split('/'), &self.allowed_prefix)
    }

    /// Fetch an authorized key, giving up after the configured timeout.
    ///
    /// Only the wait for the response head is bounded; the body is streamed
    /// for as long as the client keeps reading.
    pub async fn fetch(&self, key: &ObjectKey) -> StoreResult<StoredObject> {
        debug!("fetching `{}` from bucket `{}`", key, self.bucket);
        timeout(
            self.fetch_timeout,
            self.store.get_object(&self.bucket, key.as_str()),
        )
        .await
        .map_err(|_| StoreError::Timeout(self.fetch_timeout))?
    }

    /// Readiness: is the configured bucket reachable?
    pub async fn check_store(&self) -> StoreResult<()> {
        timeout(self.fetch_timeout, self.store.probe(&self.bucket))
            .await
            .map_err(|_| StoreError::Timeout(self.fetch_timeout))?
    }
}
