//! Object keys as requested through the proxy.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("key contains a parent-directory marker")]
    Traversal,
    #[error("key is absolute")]
    Absolute,
    #[error("key is outside the allowed prefix")]
    OutsidePrefix,
}

/// A validated, authorized object key.
///
/// Only constructible through [`ObjectKey::authorize`], so holding one means
/// the traversal and prefix checks have both passed, in that order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Join `segments` with `/`, then check traversal before the prefix.
    pub fn from_segments<I, S>(segments: I, allowed_prefix: &str) -> Result<Self, KeyError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = segments
            .into_iter()
            .map(|s| s.as_ref().to_owned())
            .collect::<Vec<_>>()
            .join("/");
        Self::authorize(joined, allowed_prefix)
    }

    /// Validate an already-joined key.
    pub fn authorize(key: impl Into<String>, allowed_prefix: &str) -> Result<Self, KeyError> {
        let key = key.into();
        if key.contains("..") {
            return Err(KeyError::Traversal);
        }
        if key.starts_with('/') {
            return Err(KeyError::Absolute);
        }
        if !key.starts_with(allowed_prefix) {
            return Err(KeyError::OutsidePrefix);
        }
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
