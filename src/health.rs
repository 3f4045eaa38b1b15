//! Backend Health Prober
//!
//! Verifies the object store is reachable by fetching a sentinel object.
//! A successful probe is cached for a configurable interval so frequent
//! health polling does not hammer the backend.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::config::ProxyConfig;
use crate::error::Result;
use crate::store::ObjectStore;

/// Rate-limited backend reachability check
pub struct HealthProber {
    /// Backend being probed
    store: Arc<dyn ObjectStore>,
    /// Bucket holding the sentinel object
    bucket: String,
    /// Sentinel object key
    sentinel: String,
    /// Window during which a successful probe is reused
    cache_interval: Duration,
    /// Time of the last successful probe, `None` until the first one.
    /// Held across the probe so concurrent checks cannot both see a stale value.
    last_checked_at: Mutex<Option<Instant>>,
}

impl HealthProber {
    /// Create a prober that has never succeeded
    pub fn new(
        store: Arc<dyn ObjectStore>,
        bucket: impl Into<String>,
        sentinel: impl Into<String>,
        cache_interval: Duration,
    ) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            sentinel: sentinel.into(),
            cache_interval,
            last_checked_at: Mutex::new(None),
        }
    }

    /// Create a prober for the configured bucket and sentinel
    pub fn from_config(store: Arc<dyn ObjectStore>, config: &ProxyConfig) -> Self {
        Self::new(
            store,
            config.store.bucket.clone(),
            config.health.file.clone(),
            config.health_cache_interval(),
        )
    }

    /// Check backend reachability.
    ///
    /// Returns immediately if the last success is within the cache interval.
    /// Otherwise fetches the sentinel; only a successful fetch moves
    /// `last_checked_at`, so a failure is retried on the next call.
    pub async fn check(&self) -> Result<()> {
        let mut last_checked_at = self.last_checked_at.lock().await;
        let now = Instant::now();

        if let Some(at) = *last_checked_at {
            if now.saturating_duration_since(at) <= self.cache_interval {
                debug!("Health check cached, last success {:?} ago", now - at);
                return Ok(());
            }
        }

        info!("Making health check for path '{}'", self.sentinel);
        match self.store.get_object(&self.bucket, &self.sentinel).await {
            Ok(_) => {
                info!("Health check passed");
                *last_checked_at = Some(now);
                Ok(())
            }
            Err(e) => {
                error!("Health check failed: {}", e);
                Err(e)
            }
        }
    }

    /// Time of the last successful probe
    pub async fn last_checked_at(&self) -> Option<Instant> {
        *self.last_checked_at.lock().await
    }
}
