//! Invalidation plan generation.
//!
//! Turns committed catalog mutations into the exact keys to delete and the
//! key families to sweep.

use std::collections::BTreeSet;
use std::fmt;

use super::events::EventKind;
use super::keys::{
    BOUQUET_TAGS_PATTERN, CATEGORY_BOUQUETS_PATTERN, Resource, bouquet_tags_key,
    category_bouquets_key, detail_key, detail_pattern, featured_pattern, list_pattern,
};

/// Keys and patterns to delete after one or more writes.
///
/// Both sets are ordered and deduplicated, so merging several events never
/// issues the same deletion twice.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InvalidationPlan {
    pub keys: BTreeSet<String>,
    pub patterns: BTreeSet<String>,
}

impl fmt::Display for InvalidationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "InvalidationPlan {{ keys: {}, patterns: [{}] }}",
            self.keys.len(),
            self.patterns
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl InvalidationPlan {
    pub fn from_event(event: &EventKind) -> Self {
        Self::from_events(std::slice::from_ref(event))
    }

    pub fn from_events(events: &[EventKind]) -> Self {
        let mut plan = Self::default();

        for event in events {
            match *event {
                EventKind::BouquetUpserted { bouquet_id }
                | EventKind::BouquetDeleted { bouquet_id } => {
                    plan.key(detail_key(Resource::Bouquet, bouquet_id));
                    plan.key(bouquet_tags_key(bouquet_id));
                    plan.collection(Resource::Bouquet);
                    plan.pattern(CATEGORY_BOUQUETS_PATTERN);
                }
                EventKind::BouquetTagsReplaced { bouquet_id } => {
                    plan.key(bouquet_tags_key(bouquet_id));
                }
                EventKind::CategoryUpserted { category_id } => {
                    plan.key(detail_key(Resource::Category, category_id));
                    plan.key(category_bouquets_key(category_id));
                    plan.collection(Resource::Category);
                    plan.bouquet_lists();
                }
                EventKind::CategoryDeleted { category_id } => {
                    plan.key(detail_key(Resource::Category, category_id));
                    plan.key(category_bouquets_key(category_id));
                    plan.collection(Resource::Category);
                    plan.bouquet_lists();
                    // Detached bouquets carry a stale `category_id` in their details.
                    plan.pattern(&detail_pattern(Resource::Bouquet));
                }
                EventKind::FlowerUpserted { flower_id } | EventKind::FlowerDeleted { flower_id } => {
                    plan.key(detail_key(Resource::Flower, flower_id));
                    plan.collection(Resource::Flower);
                    plan.bouquet_lists();
                    plan.pattern(&detail_pattern(Resource::Bouquet));
                }
                EventKind::TagUpserted { tag_id } | EventKind::TagDeleted { tag_id } => {
                    plan.key(detail_key(Resource::Tag, tag_id));
                    plan.collection(Resource::Tag);
                    plan.pattern(BOUQUET_TAGS_PATTERN);
                }
            }
        }

        plan
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty() && self.patterns.is_empty()
    }

    fn key(&mut self, key: String) {
        self.keys.insert(key);
    }

    fn pattern(&mut self, pattern: &str) {
        self.patterns.insert(pattern.to_string());
    }

    /// Every list family of a collection.
    fn collection(&mut self, resource: Resource) {
        self.patterns.insert(list_pattern(resource));
        self.patterns.insert(featured_pattern(resource));
    }

    /// Every key family that embeds bouquets in a list.
    fn bouquet_lists(&mut self) {
        self.collection(Resource::Bouquet);
        self.pattern(CATEGORY_BOUQUETS_PATTERN);
    }
}
