//! HTTP API Module
//!
//! Serves objects from the configured bucket and the cached health endpoint.

mod error;
mod http;

pub use error::{ApiError, INTERNAL_ERROR_PREFIX};
pub use http::{AppState, ProxyServer, RequestMethod, HEALTHY_BODY};
