//! Florista catalog cache.
//!
//! Read-through caching of catalog projections in an external key-value
//! store, with invalidation driven by committed admin writes.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! backend = "rest"          # rest | memory | disabled
//! rest_url = "https://kv.example.com"
//! request_timeout_ms = 2000
//!
//! [cache.ttl]
//! bouquets = 1800
//! categories = 3600
//! ```

mod client;
mod config;
mod events;
pub mod keys;
mod planner;
mod store;
mod trigger;

pub use client::CacheClient;
pub use config::CacheConfig;
pub use events::EventKind;
pub use keys::{ListKeyParts, Resource};
pub use planner::InvalidationPlan;
pub use store::{DisabledKvStore, KvError, KvStore, MemoryKvStore, glob_match};
pub use trigger::CacheTrigger;
