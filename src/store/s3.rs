//! S3 backend built on rust-s3

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use s3::creds::Credentials;
use s3::{Bucket, Region};
use tracing::debug;

use super::{ObjectStore, ObjectStream};
use crate::config::StoreConfig;
use crate::error::{Error, Result};

/// Object store client for S3 and S3-compatible services such as MinIO.
///
/// Bound to the single configured bucket.
pub struct S3ObjectStore {
    bucket: Box<Bucket>,
}

impl S3ObjectStore {
    /// Create a client from the store configuration. No network I/O happens here.
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let credentials = Credentials::new(
            Some(config.access_key.as_str()),
            Some(config.secret_key.as_str()),
            None,
            None,
            None,
        )
        .map_err(|e| Error::Config(format!("invalid object store credentials: {}", e)))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        };

        let mut bucket = Bucket::new(&config.bucket, region, credentials)
            .map_err(|e| Error::Config(format!("invalid bucket '{}': {}", config.bucket, e)))?;
        if config.path_style {
            bucket.set_path_style();
        }

        Ok(Self { bucket })
    }
}

/// Request path for `key`. rust-s3 drops one leading `/` from the path it is
/// given, so prefix one to keep keys that themselves start with `/` intact.
fn request_path(key: &str) -> String {
    format!("/{}", key)
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectStream> {
        if bucket != self.bucket.name {
            return Err(Error::object_store(
                key,
                format!("bucket '{}' is not served by this proxy", bucket),
            ));
        }

        debug!("GetObject {}/{}", bucket, key);
        let response = self
            .bucket
            .get_object_stream(request_path(key))
            .await
            .map_err(|e| Error::object_store(key, e))?;

        // Non-2xx responses carry an S3 error document, not object data
        if !(200..300).contains(&response.status_code) {
            return Err(Error::ObjectStatus {
                key: key.to_string(),
                status: response.status_code,
            });
        }

        let key = key.to_string();
        Ok(response
            .bytes
            .map_err(move |e| Error::object_store(key.clone(), e))
            .boxed())
    }
}
