//! Cache key scheme.
//!
//! Keys are plain strings shared with any other writer of the key-value store,
//! so their layout is fixed:
//!
//! - detail: `{resource}:{id}` (`bouquet:<uuid>`)
//! - list: `{collection}:list`, or `featured:{collection}` when filtered to
//!   featured entries, followed by `:category:{id}`, `:limit:{n}` and
//!   `:with-flowers` in that order
//! - sub-resources: `bouquet:{id}:tags`, `category:{id}:bouquets`
//!
//! New modifiers go at the end so existing key families keep matching their
//! sweep patterns.

use std::fmt::Write as _;

use uuid::Uuid;

/// Catalog resource kinds that own cache entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Resource {
    Bouquet,
    Category,
    Flower,
    Tag,
}

impl Resource {
    pub const ALL: [Resource; 4] = [
        Resource::Bouquet,
        Resource::Category,
        Resource::Flower,
        Resource::Tag,
    ];

    /// Prefix of detail keys.
    pub fn singular(self) -> &'static str {
        match self {
            Resource::Bouquet => "bouquet",
            Resource::Category => "category",
            Resource::Flower => "flower",
            Resource::Tag => "tag",
        }
    }

    /// Prefix of list keys.
    pub fn collection(self) -> &'static str {
        match self {
            Resource::Bouquet => "bouquets",
            Resource::Category => "categories",
            Resource::Flower => "flowers",
            Resource::Tag => "tags",
        }
    }
}

pub fn detail_key(resource: Resource, id: Uuid) -> String {
    format!("{}:{id}", resource.singular())
}

pub fn bouquet_tags_key(bouquet_id: Uuid) -> String {
    format!("{}:tags", detail_key(Resource::Bouquet, bouquet_id))
}

pub fn category_bouquets_key(category_id: Uuid) -> String {
    format!("{}:bouquets", detail_key(Resource::Category, category_id))
}

/// Filters that shape a list key.
///
/// Field order here does not matter; [`list_key`] always emits modifiers in
/// the same sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListKeyParts {
    pub featured: bool,
    pub category: Option<Uuid>,
    pub limit: Option<u32>,
    pub with_flowers: bool,
}

pub fn list_key(resource: Resource, parts: &ListKeyParts) -> String {
    let mut key = if parts.featured {
        format!("featured:{}", resource.collection())
    } else {
        format!("{}:list", resource.collection())
    };

    if let Some(category) = parts.category {
        let _ = write!(key, ":category:{category}");
    }
    if let Some(limit) = parts.limit {
        let _ = write!(key, ":limit:{limit}");
    }
    if parts.with_flowers {
        key.push_str(":with-flowers");
    }

    key
}

/// Matches every unfiltered and filtered list key of a collection.
pub fn list_pattern(resource: Resource) -> String {
    format!("{}:list*", resource.collection())
}

/// Matches every featured list key of a collection.
pub fn featured_pattern(resource: Resource) -> String {
    format!("featured:{}*", resource.collection())
}

/// Matches every detail key of a resource, including its sub-resource keys.
pub fn detail_pattern(resource: Resource) -> String {
    format!("{}:*", resource.singular())
}

pub const CATEGORY_BOUQUETS_PATTERN: &str = "category:*:bouquets";
pub const BOUQUET_TAGS_PATTERN: &str = "bouquet:*:tags";
