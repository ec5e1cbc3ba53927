//! src/services/object_store.rs
//!
//! The backing-store seam. `ObjectStore` is the one capability the proxy
//! consumes ("get object by key" plus a reachability probe); `S3Store`
//! implements it on top of the AWS SDK. The SDK client is connection-pooled
//! and cheap to clone, so a single instance is shared by all requests.

use crate::{config::AppConfig, models::object::StoredObject};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, meta::region::RegionProviderChain};
use aws_sdk_s3::{
    Client,
    config::http::HttpResponse,
    error::{DisplayErrorContext, SdkError},
    operation::get_object::GetObjectError,
};
use chrono::DateTime;
use futures::StreamExt;
use std::time::Duration;
use thiserror::Error;
use tokio_util::io::ReaderStream;
use tracing::debug;

const FALLBACK_REGION: &str = "us-east-1";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object `{key}` not found in bucket `{bucket}`")]
    ObjectNotFound { bucket: String, key: String },
    #[error("backend did not answer within {0:?}")]
    Timeout(Duration),
    #[error("backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Read-only access to a bucket-addressed object store.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch `key` from `bucket`. The returned body is streamed lazily.
    async fn get_object(&self, bucket: &str, key: &str) -> StoreResult<StoredObject>;

    /// Check that `bucket` is reachable with the configured credentials.
    async fn probe(&self, bucket: &str) -> StoreResult<()>;
}

/// `ObjectStore` backed by S3 (or any S3-compatible endpoint).
#[derive(Clone)]
pub struct S3Store {
    client: Client,
}

impl S3Store {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the standard AWS provider chain.
    ///
    /// An explicit region wins over the environment; `us-east-1` is the last
    /// resort. A custom endpoint switches to path-style addressing, which is
    /// what MinIO and friends expect.
    pub async fn from_config(cfg: &AppConfig) -> Self {
        let region = RegionProviderChain::first_try(cfg.region.clone().map(Region::new))
            .or_default_provider()
            .or_else(Region::new(FALLBACK_REGION));
        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(region)
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = cfg.endpoint_url.as_deref() {
            debug!("using custom S3 endpoint {}", endpoint);
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self::new(Client::from_conf(builder.build()))
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn get_object(&self, bucket: &str, key: &str) -> StoreResult<StoredObject> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| {
                if is_not_found(&err) {
                    StoreError::ObjectNotFound {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                    }
                } else {
                    StoreError::Backend(DisplayErrorContext(&err).to_string())
                }
            })?;

        let content_type = output.content_type().map(str::to_owned);
        let etag = output.e_tag().map(str::to_owned);
        let last_modified = output
            .last_modified()
            .and_then(|t| DateTime::from_timestamp(t.secs(), t.subsec_nanos()));
        let content_length = output
            .content_length()
            .and_then(|len| u64::try_from(len).ok());

        let body = ReaderStream::new(output.body.into_async_read()).boxed();

        Ok(StoredObject {
            body,
            content_type,
            etag,
            last_modified,
            content_length,
        })
    }

    async fn probe(&self, bucket: &str) -> StoreResult<()> {
        self.client
            .head_bucket()
            .bucket(bucket)
            .send()
            .await
            .map(|_| ())
            .map_err(|err| StoreError::Backend(DisplayErrorContext(&err).to_string()))
    }
}

/// S3 reports a missing key as `NoSuchKey`; some compatible stores only send
/// a bare 404.
fn is_not_found(err: &SdkError<GetObjectError, HttpResponse>) -> bool {
    matches!(err.as_service_error(), Some(GetObjectError::NoSuchKey(_)))
        || err
            .raw_response()
            .is_some_and(|resp| resp.status().as_u16() == 404)
}

#[cfg(test)]
pub mod testing {
    //! In-memory `ObjectStore` that records every call.

    use super::*;
    use bytes::Bytes;
    use chrono::{DateTime, Utc};
    use futures::{future, stream};
    use std::{
        collections::HashMap,
        io,
        sync::{
            Arc, Mutex,
            atomic::{AtomicBool, AtomicUsize, Ordering},
        },
    };

    #[derive(Clone)]
    pub struct FakeObject {
        pub chunks: Vec<Bytes>,
        pub content_type: Option<String>,
        pub etag: Option<String>,
        pub last_modified: Option<DateTime<Utc>>,
    }

    impl FakeObject {
        pub fn bytes(data: &'static [u8]) -> Self {
            Self {
                chunks: vec![Bytes::from_static(data)],
                content_type: None,
                etag: None,
                last_modified: None,
            }
        }
    }

    pub enum Behavior {
        Serve,
        Fail(&'static str),
        Stall,
        /// Every key yields one chunk, then the body never ends.
        Trickle(&'static [u8], Arc<AtomicBool>),
    }

    /// Sets its flag when the body holding it is dropped.
    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    pub struct RecordingStore {
        objects: HashMap<(String, String), FakeObject>,
        behavior: Behavior,
        calls: AtomicUsize,
        keys: Mutex<Vec<String>>,
    }

    impl RecordingStore {
        pub fn new() -> Self {
            Self {
                objects: HashMap::new(),
                behavior: Behavior::Serve,
                calls: AtomicUsize::new(0),
                keys: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(message: &'static str) -> Self {
            Self {
                behavior: Behavior::Fail(message),
                ..Self::new()
            }
        }

        pub fn stalled() -> Self {
            Self {
                behavior: Behavior::Stall,
                ..Self::new()
            }
        }

        /// `dropped` flips to true once the returned body is released.
        pub fn trickling(first: &'static [u8], dropped: Arc<AtomicBool>) -> Self {
            Self {
                behavior: Behavior::Trickle(first, dropped),
                ..Self::new()
            }
        }

        pub fn with_object(mut self, bucket: &str, key: &str, object: FakeObject) -> Self {
            self.objects
                .insert((bucket.to_string(), key.to_string()), object);
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn requested_keys(&self) -> Vec<String> {
            self.keys.lock().unwrap().clone()
        }

        async fn act(&self) -> StoreResult<()> {
            match self.behavior {
                Behavior::Serve | Behavior::Trickle(..) => Ok(()),
                Behavior::Fail(message) => Err(StoreError::Backend(message.to_string())),
                Behavior::Stall => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(())
                }
            }
        }
    }

    #[async_trait]
    impl ObjectStore for RecordingStore {
        async fn get_object(&self, bucket: &str, key: &str) -> StoreResult<StoredObject> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.keys.lock().unwrap().push(key.to_string());
            self.act().await?;

            if let Behavior::Trickle(first, dropped) = &self.behavior {
                let guard = DropFlag(dropped.clone());
                let body = stream::once(future::ready(Ok::<_, io::Error>(Bytes::from_static(
                    *first,
                ))))
                .chain(stream::pending())
                .map(move |chunk| {
                    let _held = &guard;
                    chunk
                })
                .boxed();
                return Ok(StoredObject {
                    body,
                    content_type: Some("video/mp4".into()),
                    etag: None,
                    last_modified: None,
                    content_length: None,
                });
            }

            let object = self
                .objects
                .get(&(bucket.to_string(), key.to_string()))
                .cloned()
                .ok_or_else(|| StoreError::ObjectNotFound {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                })?;

            let content_length = object.chunks.iter().map(|c| c.len() as u64).sum();
            Ok(StoredObject {
                body: futures::stream::iter(object.chunks.into_iter().map(Ok)).boxed(),
                content_type: object.content_type,
                etag: object.etag,
                last_modified: object.last_modified,
                content_length: Some(content_length),
            })
        }

        async fn probe(&self, _bucket: &str) -> StoreResult<()> {
            self.act().await
        }
    }
}
