//! Object Store Backends
//!
//! The proxy only ever reads whole objects, so the capability it needs from a
//! backend is a single streaming `get_object` call.

mod s3;

#[cfg(test)]
pub(crate) mod memory;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

use crate::error::Result;

pub use s3::S3ObjectStore;

/// Body of a fetched object, yielded in chunks as the backend delivers them
pub type ObjectStream = BoxStream<'static, Result<Bytes>>;

/// Read access to an S3-compatible object store
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch `key` from `bucket`.
    ///
    /// Missing objects, permission failures and connectivity problems are all
    /// reported as errors; callers do not distinguish between them.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectStream>;
}
