//! Conversion of persisted records into the cached JSON projections.

use std::collections::HashMap;

use uuid::Uuid;

use florista_api_types::{
    BouquetFlower, BouquetSummary, BouquetWithRelated, CategoryView, FlowerView, MediaItem,
    TagView,
};

use crate::domain::entities::{
    BouquetFlowerRecord, BouquetMediaRecord, BouquetRecord, CategoryRecord, FlowerRecord,
    TagRecord,
};
use crate::domain::types::MediaKind;

impl From<BouquetRecord> for BouquetSummary {
    fn from(record: BouquetRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            description: record.description,
            price_cents: record.price_cents,
            category_id: record.category_id,
            featured: record.featured,
            in_stock: record.in_stock,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

impl From<CategoryRecord> for CategoryView {
    fn from(record: CategoryRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            description: record.description,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

impl From<FlowerRecord> for FlowerView {
    fn from(record: FlowerRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            description: record.description,
            color: record.color,
            price_cents: record.price_cents,
            in_stock: record.in_stock,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

impl From<TagRecord> for TagView {
    fn from(record: TagRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
        }
    }
}

impl From<BouquetFlowerRecord> for BouquetFlower {
    fn from(record: BouquetFlowerRecord) -> Self {
        Self {
            id: record.flower_id,
            name: record.name,
            color: record.color,
            quantity: record.quantity,
        }
    }
}

impl From<BouquetMediaRecord> for MediaItem {
    fn from(record: BouquetMediaRecord) -> Self {
        Self {
            id: record.id,
            url: record.url,
            kind: record.kind,
            is_thumbnail: record.is_thumbnail,
            position: record.position,
        }
    }
}

/// Image shown for a bouquet: the thumbnail when it is an image, otherwise
/// the first image in media order.
pub fn display_image(media: &[MediaItem]) -> Option<String> {
    media
        .iter()
        .find(|item| item.is_thumbnail && item.kind == MediaKind::Image)
        .or_else(|| media.iter().find(|item| item.kind == MediaKind::Image))
        .map(|item| item.url.clone())
}

/// Merge batched relation rows into their bouquets, keeping bouquet order.
pub fn assemble_bouquets(
    bouquets: Vec<BouquetRecord>,
    flowers: Vec<BouquetFlowerRecord>,
    media: Vec<BouquetMediaRecord>,
) -> Vec<BouquetWithRelated> {
    let mut flowers_by_bouquet: HashMap<Uuid, Vec<BouquetFlower>> = HashMap::new();
    for row in flowers {
        flowers_by_bouquet
            .entry(row.bouquet_id)
            .or_default()
            .push(row.into());
    }

    let mut media_by_bouquet: HashMap<Uuid, Vec<MediaItem>> = HashMap::new();
    for row in media {
        media_by_bouquet
            .entry(row.bouquet_id)
            .or_default()
            .push(row.into());
    }

    bouquets
        .into_iter()
        .map(|record| {
            let flowers = flowers_by_bouquet.remove(&record.id).unwrap_or_default();
            let media = media_by_bouquet.remove(&record.id).unwrap_or_default();
            let thumbnail = media.iter().find(|item| item.is_thumbnail).cloned();
            let image = display_image(&media);

            BouquetWithRelated {
                bouquet: record.into(),
                flowers,
                media,
                thumbnail,
                image,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use super::*;

    fn bouquet(name: &str) -> BouquetRecord {
        BouquetRecord {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            price_cents: 3_900,
            category_id: None,
            featured: false,
            in_stock: true,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn media(bouquet_id: Uuid, url: &str, kind: MediaKind, is_thumbnail: bool) -> BouquetMediaRecord {
        BouquetMediaRecord {
            id: Uuid::new_v4(),
            bouquet_id,
            url: url.to_string(),
            kind,
            is_thumbnail,
            position: 0,
        }
    }

    #[test]
    fn relations_are_grouped_by_parent() {
        let first = bouquet("Sunrise");
        let second = bouquet("Evening");
        let flowers = vec![
            BouquetFlowerRecord {
                bouquet_id: second.id,
                flower_id: Uuid::new_v4(),
                name: "Lily".to_string(),
                color: None,
                quantity: 3,
            },
            BouquetFlowerRecord {
                bouquet_id: first.id,
                flower_id: Uuid::new_v4(),
                name: "Rose".to_string(),
                color: Some("red".to_string()),
                quantity: 12,
            },
        ];

        let assembled = assemble_bouquets(vec![first.clone(), second.clone()], flowers, Vec::new());

        assert_eq!(assembled.len(), 2);
        assert_eq!(assembled[0].bouquet.id, first.id);
        assert_eq!(assembled[0].flowers[0].name, "Rose");
        assert_eq!(assembled[1].flowers[0].quantity, 3);
        assert!(assembled[1].media.is_empty());
        assert_eq!(assembled[1].image, None);
    }

    #[test]
    fn thumbnail_image_wins_over_first_image() {
        let record = bouquet("Meadow");
        let rows = vec![
            media(record.id, "a.jpg", MediaKind::Image, false),
            media(record.id, "b.jpg", MediaKind::Image, true),
        ];

        let assembled = assemble_bouquets(vec![record], Vec::new(), rows);

        assert_eq!(assembled[0].image.as_deref(), Some("b.jpg"));
        assert_eq!(
            assembled[0].thumbnail.as_ref().map(|item| item.url.as_str()),
            Some("b.jpg")
        );
    }

    #[test]
    fn video_thumbnail_falls_back_to_first_image() {
        let record = bouquet("Garden");
        let rows = vec![
            media(record.id, "clip.mp4", MediaKind::Video, true),
            media(record.id, "still.jpg", MediaKind::Image, false),
        ];

        let assembled = assemble_bouquets(vec![record], Vec::new(), rows);

        assert_eq!(assembled[0].image.as_deref(), Some("still.jpg"));
        assert_eq!(
            assembled[0].thumbnail.as_ref().map(|item| item.kind),
            Some(MediaKind::Video)
        );
    }
}
