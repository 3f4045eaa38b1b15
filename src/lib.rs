//! rest-minio-proxy - Read-only HTTP front-end for S3-compatible object stores
//!
//! Translates `GET /<key>` into a fetch of `<key>` from a single configured
//! bucket and streams the object back verbatim. A reserved health path
//! reports backend reachability by fetching a sentinel object, caching a
//! successful result for a configurable interval.
//!
//! # Architecture
//!
//! - [`config`]: startup configuration from a TOML file and environment
//! - [`store`]: the object store capability and its S3 backend
//! - [`health`]: the rate-limited sentinel probe
//! - [`api`]: routing, object streaming and error responses

pub mod config;
pub mod error;
pub mod store;
pub mod health;
pub mod api;

pub use config::ProxyConfig;
pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::api::ProxyServer;
    pub use crate::config::ProxyConfig;
    pub use crate::error::{Error, Result};
    pub use crate::health::HealthProber;
    pub use crate::store::{ObjectStore, ObjectStream, S3ObjectStore};
}
