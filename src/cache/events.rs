//! Catalog mutations that require cache invalidation.

use std::fmt;

use uuid::Uuid;

use super::keys::Resource;

/// A committed catalog write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A bouquet was created or updated, including its composition and media.
    BouquetUpserted { bouquet_id: Uuid },
    BouquetDeleted { bouquet_id: Uuid },
    /// The tag set attached to a bouquet was replaced.
    BouquetTagsReplaced { bouquet_id: Uuid },
    CategoryUpserted { category_id: Uuid },
    /// Deleting a category detaches its bouquets (`category_id` becomes null).
    CategoryDeleted { category_id: Uuid },
    FlowerUpserted { flower_id: Uuid },
    FlowerDeleted { flower_id: Uuid },
    TagUpserted { tag_id: Uuid },
    TagDeleted { tag_id: Uuid },
}

impl EventKind {
    /// Resource and id of the entity that changed.
    pub fn subject(&self) -> (Resource, Uuid) {
        match *self {
            EventKind::BouquetUpserted { bouquet_id }
            | EventKind::BouquetDeleted { bouquet_id }
            | EventKind::BouquetTagsReplaced { bouquet_id } => (Resource::Bouquet, bouquet_id),
            EventKind::CategoryUpserted { category_id }
            | EventKind::CategoryDeleted { category_id } => (Resource::Category, category_id),
            EventKind::FlowerUpserted { flower_id } | EventKind::FlowerDeleted { flower_id } => {
                (Resource::Flower, flower_id)
            }
            EventKind::TagUpserted { tag_id } | EventKind::TagDeleted { tag_id } => {
                (Resource::Tag, tag_id)
            }
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            EventKind::BouquetUpserted { .. }
            | EventKind::CategoryUpserted { .. }
            | EventKind::FlowerUpserted { .. }
            | EventKind::TagUpserted { .. } => "upserted",
            EventKind::BouquetDeleted { .. }
            | EventKind::CategoryDeleted { .. }
            | EventKind::FlowerDeleted { .. }
            | EventKind::TagDeleted { .. } => "deleted",
            EventKind::BouquetTagsReplaced { .. } => "tags_replaced",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (resource, id) = self.subject();
        write!(f, "{}:{id} {}", resource.singular(), self.action())
    }
}
