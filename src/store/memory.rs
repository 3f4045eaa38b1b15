//! In-memory object store used by tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;

use super::{ObjectStore, ObjectStream};
use crate::error::{Error, Result};

/// Object store backed by a map, counting every fetch it serves
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<(String, String), Bytes>>,
    calls: AtomicUsize,
    unreachable: AtomicBool,
    broken_stream: AtomicBool,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, bucket: &str, key: &str, data: impl Into<Bytes>) {
        self.objects
            .lock()
            .unwrap()
            .insert((bucket.to_string(), key.to_string()), data.into());
    }

    /// Make every fetch fail as if the backend were down
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Fail every object body after its first chunk has been delivered
    pub fn set_broken_stream(&self, broken: bool) {
        self.broken_stream.store(broken, Ordering::SeqCst);
    }

    /// Number of `get_object` calls served so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectStream> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.unreachable.load(Ordering::SeqCst) {
            return Err(Error::object_store(key, "connection refused"));
        }

        let data = self
            .objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| Error::ObjectStatus {
                key: key.to_string(),
                status: 404,
            })?;

        // Deliver in two chunks so consumers must concatenate
        let mid = data.len() / 2;
        let tail = if self.broken_stream.load(Ordering::SeqCst) {
            Err(Error::object_store(key, "connection reset"))
        } else {
            Ok(data.slice(mid..))
        };
        let chunks = vec![Ok(data.slice(..mid)), tail];
        Ok(futures::stream::iter(chunks).boxed())
    }
}
