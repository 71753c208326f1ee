//! Logged, fail-open access to the key-value store.
//!
//! Backend faults never escape this type: reads degrade to a miss, writes and
//! deletions are dropped. Every operation records a latency sample and a
//! structured event.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, info, warn};

use super::config::CacheConfig;
use super::store::{KvError, KvStore};

const METRIC_CACHE_HIT: &str = "florista_cache_hit_total";
const METRIC_CACHE_MISS: &str = "florista_cache_miss_total";
const METRIC_CACHE_ERROR: &str = "florista_cache_error_total";
const METRIC_CACHE_INVALIDATED: &str = "florista_cache_invalidated_keys_total";
const METRIC_CACHE_OP_MS: &str = "florista_cache_op_ms";

pub struct CacheClient {
    store: Arc<dyn KvStore>,
    config: CacheConfig,
}

impl CacheClient {
    pub fn new(store: Arc<dyn KvStore>, config: CacheConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    /// Connectivity self-test, run once at startup.
    ///
    /// Returns whether the backend answered; a failure is logged and the
    /// process keeps serving from the database.
    pub async fn initialize(&self) -> bool {
        let started_at = Instant::now();
        let result = self.store.ping().await;
        record_latency("ping", started_at);

        match result {
            Ok(()) => {
                info!(
                    backend = self.store.backend(),
                    enabled = self.config.enabled,
                    "Cache backend reachable"
                );
                true
            }
            Err(err) => {
                self.record_error("ping", "-", &err);
                warn!(
                    backend = self.store.backend(),
                    "Cache backend unreachable; catalog reads will fall through to the database"
                );
                false
            }
        }
    }

    /// Fetch and decode a cached value.
    ///
    /// Misses, backend faults and undecodable payloads all yield `None`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if !self.config.enabled {
            return None;
        }

        let started_at = Instant::now();
        let result = self.store.get(key).await;
        record_latency("get", started_at);

        let raw = match result {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                counter!(METRIC_CACHE_MISS).increment(1);
                debug!(cache_key = key, "Cache miss");
                return None;
            }
            Err(err) => {
                self.record_error("get", key, &err);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => {
                counter!(METRIC_CACHE_HIT).increment(1);
                debug!(cache_key = key, "Cache hit");
                Some(value)
            }
            Err(err) => {
                counter!(METRIC_CACHE_ERROR, "op" => "decode").increment(1);
                warn!(cache_key = key, error = %err, "Discarding undecodable cache entry");
                None
            }
        }
    }

    /// Encode and store a value with an expiry.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) {
        if !self.config.enabled {
            return;
        }

        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(err) => {
                counter!(METRIC_CACHE_ERROR, "op" => "encode").increment(1);
                warn!(cache_key = key, error = %err, "Cache value could not be encoded");
                return;
            }
        };

        let started_at = Instant::now();
        let result = self.store.set_ex(key, &payload, ttl).await;
        record_latency("set", started_at);

        match result {
            Ok(()) => debug!(
                cache_key = key,
                ttl_secs = ttl.as_secs(),
                bytes = payload.len(),
                "Cache entry stored"
            ),
            Err(err) => self.record_error("set", key, &err),
        }
    }

    /// Serve `key` from the cache, or run `load`, store its result and return it.
    ///
    /// Errors from `load` are returned untouched and never cached.
    pub async fn read_through<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        load: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(cached) = self.get::<T>(key).await {
            return Ok(cached);
        }

        let value = load().await?;
        self.set(key, &value, ttl).await;
        Ok(value)
    }

    /// Like [`Self::read_through`] for lookups that may find nothing.
    ///
    /// `None` is returned to the caller but never stored.
    pub async fn read_through_optional<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        load: F,
    ) -> Result<Option<T>, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
    {
        if let Some(cached) = self.get::<T>(key).await {
            return Ok(Some(cached));
        }

        let value = load().await?;
        if let Some(value) = &value {
            self.set(key, value, ttl).await;
        }
        Ok(value)
    }

    /// Delete one key; returns whether it existed.
    pub async fn invalidate_cache_key(&self, key: &str) -> bool {
        let started_at = Instant::now();
        let result = self.store.del(key).await;
        record_latency("del", started_at);

        match result {
            Ok(existed) => {
                if existed {
                    counter!(METRIC_CACHE_INVALIDATED).increment(1);
                }
                debug!(cache_key = key, existed, "Cache key invalidated");
                existed
            }
            Err(err) => {
                self.record_error("del", key, &err);
                false
            }
        }
    }

    /// Delete each key individually; returns how many existed.
    pub async fn invalidate_multiple_keys<S: AsRef<str>>(&self, keys: &[S]) -> usize {
        let mut deleted = 0;
        for key in keys {
            if self.invalidate_cache_key(key.as_ref()).await {
                deleted += 1;
            }
        }
        info!(requested = keys.len(), deleted, "Cache keys invalidated");
        deleted
    }

    /// Delete every key matching a glob pattern; returns how many were removed.
    ///
    /// Lists matches first and deletes them one by one, so keys written in
    /// between are not covered.
    pub async fn invalidate_by_pattern(&self, pattern: &str) -> usize {
        let started_at = Instant::now();
        let result = self.store.keys(pattern).await;
        record_latency("keys", started_at);

        let matched = match result {
            Ok(keys) => keys,
            Err(err) => {
                self.record_error("keys", pattern, &err);
                return 0;
            }
        };

        let mut deleted = 0;
        for key in &matched {
            if self.invalidate_cache_key(key).await {
                deleted += 1;
            }
        }

        info!(
            cache_pattern = pattern,
            matched = matched.len(),
            deleted,
            "Cache pattern invalidated"
        );
        deleted
    }

    fn record_error(&self, op: &'static str, key: &str, err: &KvError) {
        counter!(METRIC_CACHE_ERROR, "op" => op).increment(1);
        warn!(
            backend = self.store.backend(),
            op,
            cache_key = key,
            error = %err,
            "Cache operation failed"
        );
    }
}

fn record_latency(op: &'static str, started_at: Instant) {
    histogram!(METRIC_CACHE_OP_MS, "op" => op).record(started_at.elapsed().as_secs_f64() * 1000.0);
}
