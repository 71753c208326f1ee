//! Cache trigger service.
//!
//! Write paths call into this after their transaction commits. Invalidation
//! is awaited so the response only goes out once stale entries are gone, but
//! it never fails the request.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};
use uuid::Uuid;

use florista_api_types::InvalidationResult;

use super::client::CacheClient;
use super::events::EventKind;
use super::planner::InvalidationPlan;

/// # Usage
///
/// ```ignore
/// // After a successful bouquet update:
/// trigger.bouquet_upserted(bouquet.id).await;
/// ```
#[derive(Clone)]
pub struct CacheTrigger {
    client: Arc<CacheClient>,
}

impl CacheTrigger {
    pub fn new(client: Arc<CacheClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<CacheClient> {
        &self.client
    }

    /// Plan and execute invalidation for one committed write.
    pub async fn trigger(&self, kind: EventKind) {
        if !self.client.config().enabled {
            debug!(event = %kind, "Cache trigger skipped: cache disabled");
            return;
        }

        let plan = InvalidationPlan::from_event(&kind);
        let started_at = Instant::now();
        let (keys_deleted, pattern_deleted) = self.execute(&plan).await;

        info!(
            event = %kind,
            plan = %plan,
            keys_deleted,
            pattern_deleted,
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            "Cache invalidated after write"
        );
    }

    async fn execute(&self, plan: &InvalidationPlan) -> (usize, usize) {
        let keys: Vec<&str> = plan.keys.iter().map(String::as_str).collect();
        let keys_deleted = self.client.invalidate_multiple_keys(&keys).await;

        let mut pattern_deleted = 0;
        for pattern in &plan.patterns {
            pattern_deleted += self.client.invalidate_by_pattern(pattern).await;
        }

        (keys_deleted, pattern_deleted)
    }

    /// Operator-requested invalidation of explicit keys and patterns.
    ///
    /// Runs even when read caching is disabled so stale entries written by
    /// another instance can still be cleared. A provided key list always
    /// yields a `keys` result, even when it is empty.
    pub async fn invalidate_requested(
        &self,
        keys: Option<&[String]>,
        patterns: &[String],
    ) -> Vec<InvalidationResult> {
        let mut results = Vec::with_capacity(patterns.len() + 1);

        if let Some(keys) = keys {
            let count = self.client.invalidate_multiple_keys(keys).await;
            results.push(InvalidationResult::Keys { count });
        }

        for pattern in patterns {
            let count = self.client.invalidate_by_pattern(pattern).await;
            results.push(InvalidationResult::Pattern {
                pattern: pattern.clone(),
                count,
            });
        }

        results
    }

    pub async fn bouquet_upserted(&self, bouquet_id: Uuid) {
        self.trigger(EventKind::BouquetUpserted { bouquet_id }).await;
    }

    pub async fn bouquet_deleted(&self, bouquet_id: Uuid) {
        self.trigger(EventKind::BouquetDeleted { bouquet_id }).await;
    }

    pub async fn bouquet_tags_replaced(&self, bouquet_id: Uuid) {
        self.trigger(EventKind::BouquetTagsReplaced { bouquet_id })
            .await;
    }

    pub async fn category_upserted(&self, category_id: Uuid) {
        self.trigger(EventKind::CategoryUpserted { category_id })
            .await;
    }

    pub async fn category_deleted(&self, category_id: Uuid) {
        self.trigger(EventKind::CategoryDeleted { category_id })
            .await;
    }

    pub async fn flower_upserted(&self, flower_id: Uuid) {
        self.trigger(EventKind::FlowerUpserted { flower_id }).await;
    }

    pub async fn flower_deleted(&self, flower_id: Uuid) {
        self.trigger(EventKind::FlowerDeleted { flower_id }).await;
    }

    pub async fn tag_upserted(&self, tag_id: Uuid) {
        self.trigger(EventKind::TagUpserted { tag_id }).await;
    }

    pub async fn tag_deleted(&self, tag_id: Uuid) {
        self.trigger(EventKind::TagDeleted { tag_id }).await;
    }
}
