//! HTTP API Server
//!
//! A single catch-all route: the request path (minus its leading slash) is
//! the object key. The reserved health path is answered by the
//! [`HealthProber`]; every other GET streams the object from the bucket.

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use futures::TryStreamExt;
use percent_encoding::percent_decode_str;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::error::ApiError;
use crate::config::ProxyConfig;
use crate::error::{Error, Result};
use crate::health::HealthProber;
use crate::store::ObjectStore;

/// Body returned by a healthy health check
pub const HEALTHY_BODY: &str = "OK";

/// HTTP methods the router distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Other,
}

impl From<&Method> for RequestMethod {
    fn from(method: &Method) -> Self {
        match *method {
            Method::GET => RequestMethod::Get,
            Method::HEAD => RequestMethod::Head,
            Method::POST => RequestMethod::Post,
            Method::PUT => RequestMethod::Put,
            Method::DELETE => RequestMethod::Delete,
            Method::PATCH => RequestMethod::Patch,
            Method::OPTIONS => RequestMethod::Options,
            _ => RequestMethod::Other,
        }
    }
}

/// Shared application state, built once at startup
pub struct AppState {
    /// Bucket every object is served from
    pub bucket: String,
    /// Reserved health path (without leading slash)
    pub health_path: String,
    /// Object store backend
    pub store: Arc<dyn ObjectStore>,
    /// Cached backend health check
    pub prober: HealthProber,
}

impl AppState {
    pub fn new(config: &ProxyConfig, store: Arc<dyn ObjectStore>) -> Self {
        let prober = HealthProber::from_config(Arc::clone(&store), config);
        Self {
            bucket: config.store.bucket.clone(),
            health_path: config.health.path.clone(),
            store,
            prober,
        }
    }
}

/// HTTP proxy server
pub struct ProxyServer {
    address: String,
    state: Arc<AppState>,
}

impl ProxyServer {
    /// Create a new proxy server
    pub fn new(config: &ProxyConfig, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            address: config.listen_address(),
            state: Arc::new(AppState::new(config, store)),
        }
    }

    /// Get the state for sharing with other components
    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    /// Create the router
    pub fn router(&self) -> Router {
        Router::new()
            .fallback(handle_request)
            .with_state(Arc::clone(&self.state))
            .layer(TraceLayer::new_for_http())
    }

    /// Bind the listener and serve until `shutdown` resolves
    pub async fn run<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = tokio::net::TcpListener::bind(&self.address)
            .await
            .map_err(|source| Error::Bind {
                address: self.address.clone(),
                source,
            })?;
        info!("HTTP listening on {}", self.address);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| Error::Server(format!("HTTP server error: {}", e)))?;

        Ok(())
    }
}

// ============ Handlers ============

async fn handle_request(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
) -> Response {
    match route(&state, &method, uri.path()).await {
        Ok(response) => response,
        Err(error) => error.into_response(),
    }
}

async fn route(
    state: &AppState,
    method: &Method,
    path: &str,
) -> std::result::Result<Response, ApiError> {
    let key = object_key(path)?;
    if key.is_empty() {
        return Err(ApiError::bad_request("Path must be provided"));
    }

    if key == state.health_path {
        return match RequestMethod::from(method) {
            RequestMethod::Get => serve_health(state).await,
            _ => Err(ApiError::method_not_allowed(
                "method not allowed for health endpoint",
            )),
        };
    }

    info!("Handling {} request for '{}'", method, key);

    match RequestMethod::from(method) {
        RequestMethod::Get => serve_object(state, &key).await,
        RequestMethod::Head
        | RequestMethod::Post
        | RequestMethod::Put
        | RequestMethod::Delete
        | RequestMethod::Patch
        | RequestMethod::Options
        | RequestMethod::Other => Err(ApiError::method_not_allowed(format!(
            "method {} not supported",
            method
        ))),
    }
}

/// Strip the single leading slash and percent-decode the rest
fn object_key(path: &str) -> std::result::Result<Cow<'_, str>, ApiError> {
    let raw = path.strip_prefix('/').unwrap_or(path);
    percent_decode_str(raw)
        .decode_utf8()
        .map_err(|_| ApiError::bad_request("Invalid object key encoding"))
}

async fn serve_health(state: &AppState) -> std::result::Result<Response, ApiError> {
    state.prober.check().await?;
    Ok((StatusCode::OK, HEALTHY_BODY).into_response())
}

async fn serve_object(state: &AppState, key: &str) -> std::result::Result<Response, ApiError> {
    let stream = state.store.get_object(&state.bucket, key).await?;

    // Bytes already sent cannot be recalled; a broken stream aborts the response
    let key = key.to_string();
    let stream = stream.inspect_err(move |e| warn!("Stream of '{}' failed mid-body: {}", key, e));

    Ok(Response::new(Body::from_stream(stream)))
}
