//! Per-user snapshots of fetched collections.
//!
//! A snapshot is the last collection a service returned for one caller and
//! one resource. Paging through a list reads the snapshot; a successful
//! mutation patches it in place so the next page view reflects the change
//! without another upstream round trip.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::core::config::{CacheBackend, Settings};
use crate::core::redis::RedisHandle;
use crate::services::upstream::UpstreamError;

/// Items addressable by a stable id within their collection.
pub(crate) trait Keyed {
    fn key(&self) -> &str;
}

/// Drops the item with `key`; returns whether anything was removed.
pub(crate) fn remove_item<T: Keyed>(items: &mut Vec<T>, key: &str) -> bool {
    let before = items.len();
    items.retain(|item| item.key() != key);
    items.len() != before
}

/// Swaps in `replacement` at the position of the item sharing its key.
pub(crate) fn replace_item<T: Keyed>(items: &mut [T], replacement: T) -> bool {
    match items.iter_mut().find(|item| item.key() == replacement.key()) {
        Some(slot) => {
            *slot = replacement;
            true
        }
        None => false,
    }
}

/// New items go to the front, matching the newest-first order services use.
pub(crate) fn insert_item<T: Keyed>(items: &mut Vec<T>, item: T) {
    remove_item(items, item.key());
    items.insert(0, item);
}

#[derive(Clone)]
enum SnapshotBackend {
    Redis(RedisHandle),
    Memory(Arc<Mutex<HashMap<String, MemoryEntry>>>),
}

struct MemoryEntry {
    raw: String,
    expires_at: Instant,
}

#[derive(Clone)]
pub(crate) struct CollectionStore {
    backend: SnapshotBackend,
    ttl_seconds: u64,
}

impl CollectionStore {
    pub(crate) fn redis(redis: RedisHandle, ttl_seconds: u64) -> Self {
        Self { backend: SnapshotBackend::Redis(redis), ttl_seconds }
    }

    pub(crate) fn in_memory(ttl_seconds: u64) -> Self {
        Self { backend: SnapshotBackend::Memory(Arc::default()), ttl_seconds }
    }

    pub(crate) fn from_settings(settings: &Settings, redis: RedisHandle) -> Self {
        let listing = settings.listing();
        match listing.collection_cache_backend {
            CacheBackend::Redis => Self::redis(redis, listing.collection_cache_seconds),
            CacheBackend::Memory => Self::in_memory(listing.collection_cache_seconds),
        }
    }

    pub(crate) fn key(user_id: &str, resource: &str) -> String {
        format!("collection:{user_id}:{resource}")
    }

    async fn read_raw(&self, key: &str) -> Option<String> {
        match &self.backend {
            SnapshotBackend::Redis(redis) => match redis.get(key).await {
                Ok(raw) => raw,
                Err(err) => {
                    tracing::warn!(error = %err, key = %key, "Failed to read collection snapshot");
                    None
                }
            },
            SnapshotBackend::Memory(entries) => {
                let mut entries = lock_entries(entries);
                let fresh = entries
                    .get(key)
                    .filter(|entry| entry.expires_at > Instant::now())
                    .map(|entry| entry.raw.clone());
                if fresh.is_none() {
                    entries.remove(key);
                }
                fresh
            }
        }
    }

    async fn write_raw(&self, key: &str, raw: String) {
        match &self.backend {
            SnapshotBackend::Redis(redis) => {
                if let Err(err) = redis.set_ex(key, &raw, self.ttl_seconds).await {
                    tracing::warn!(error = %err, key = %key, "Failed to write collection snapshot");
                }
            }
            SnapshotBackend::Memory(entries) => {
                let now = Instant::now();
                let expires_at = now + Duration::from_secs(self.ttl_seconds.max(1));
                let mut entries = lock_entries(entries);
                entries.retain(|_, entry| entry.expires_at > now);
                entries.insert(key.to_string(), MemoryEntry { raw, expires_at });
            }
        }
    }

    async fn drop_raw(&self, key: &str) {
        match &self.backend {
            SnapshotBackend::Redis(redis) => {
                if let Err(err) = redis.delete(key).await {
                    tracing::warn!(error = %err, key = %key, "Failed to drop collection snapshot");
                }
            }
            SnapshotBackend::Memory(entries) => {
                lock_entries(entries).remove(key);
            }
        }
    }

    pub(crate) async fn load<T: DeserializeOwned>(
        &self,
        user_id: &str,
        resource: &str,
    ) -> Option<Vec<T>> {
        let key = Self::key(user_id, resource);
        let raw = self.read_raw(&key).await?;

        match serde_json::from_str(&raw) {
            Ok(items) => Some(items),
            Err(err) => {
                tracing::warn!(error = %err, key = %key, "Discarding unreadable collection snapshot");
                None
            }
        }
    }

    pub(crate) async fn store<T: Serialize>(&self, user_id: &str, resource: &str, items: &[T]) {
        let key = Self::key(user_id, resource);
        match serde_json::to_string(items) {
            Ok(raw) => self.write_raw(&key, raw).await,
            Err(err) => {
                tracing::warn!(error = %err, key = %key, "Failed to encode collection snapshot");
            }
        }
    }

    pub(crate) async fn invalidate(&self, user_id: &str, resource: &str) {
        self.drop_raw(&Self::key(user_id, resource)).await;
    }

    /// Applies `change` to an existing snapshot. A missing snapshot stays
    /// missing; the next list request fetches fresh.
    pub(crate) async fn update<T, F>(&self, user_id: &str, resource: &str, change: F)
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut Vec<T>),
    {
        let Some(mut items) = self.load::<T>(user_id, resource).await else {
            return;
        };
        change(&mut items);
        self.store(user_id, resource, &items).await;
    }

    /// Returns the snapshot unless `refresh` is set or none exists, in which
    /// case `fetch` runs and its result replaces the snapshot.
    pub(crate) async fn fetch_or_load<T, F, Fut>(
        &self,
        user_id: &str,
        resource: &str,
        refresh: bool,
        fetch: F,
    ) -> Result<Vec<T>, UpstreamError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, UpstreamError>>,
    {
        if !refresh {
            if let Some(items) = self.load(user_id, resource).await {
                return Ok(items);
            }
        }

        let items = fetch().await?;
        self.store(user_id, resource, &items).await;
        Ok(items)
    }
}

fn lock_entries(
    entries: &Mutex<HashMap<String, MemoryEntry>>,
) -> MutexGuard<'_, HashMap<String, MemoryEntry>> {
    // entries are replaced whole, so a poisoned map is still consistent
    entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
