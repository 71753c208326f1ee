//! Cache configuration.
//!
//! Expiry per resource family, resolved from the `[cache]` section of
//! `florista.toml`.

use std::time::Duration;

use serde::Deserialize;

use super::keys::Resource;

const DEFAULT_BOUQUET_TTL_SECS: u64 = 1800;
const DEFAULT_CATEGORY_TTL_SECS: u64 = 3600;
const DEFAULT_FLOWER_TTL_SECS: u64 = 3600;
const DEFAULT_TAG_TTL_SECS: u64 = 3600;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// When false, reads always hit the database and invalidation is skipped.
    pub enabled: bool,
    pub bouquet_ttl_secs: u64,
    pub category_ttl_secs: u64,
    pub flower_ttl_secs: u64,
    pub tag_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bouquet_ttl_secs: DEFAULT_BOUQUET_TTL_SECS,
            category_ttl_secs: DEFAULT_CATEGORY_TTL_SECS,
            flower_ttl_secs: DEFAULT_FLOWER_TTL_SECS,
            tag_ttl_secs: DEFAULT_TAG_TTL_SECS,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.backend.is_enabled(),
            bouquet_ttl_secs: settings.ttl.bouquets.get(),
            category_ttl_secs: settings.ttl.categories.get(),
            flower_ttl_secs: settings.ttl.flowers.get(),
            tag_ttl_secs: settings.ttl.tags.get(),
        }
    }
}

impl CacheConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Expiry applied to every key owned by `resource`.
    pub fn ttl_for(&self, resource: Resource) -> Duration {
        let secs = match resource {
            Resource::Bouquet => self.bouquet_ttl_secs,
            Resource::Category => self.category_ttl_secs,
            Resource::Flower => self.flower_ttl_secs,
            Resource::Tag => self.tag_ttl_secs,
        };
        Duration::from_secs(secs.max(1))
    }
}
