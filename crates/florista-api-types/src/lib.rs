//! Request and response types shared by the Florista server and its clients.
//!
//! The catalog projections in this crate are also the payloads stored in the
//! read-through cache, so they must round-trip through JSON without loss.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

// ============================================================================
// Catalog projections
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: Uuid,
    pub url: String,
    pub kind: MediaKind,
    pub is_thumbnail: bool,
    pub position: i32,
}

/// Flower entry embedded in a bouquet projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BouquetFlower {
    pub id: Uuid,
    pub name: String,
    pub color: Option<String>,
    pub quantity: i32,
}

/// Bouquet projection without related entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BouquetSummary {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub category_id: Option<Uuid>,
    pub featured: bool,
    pub in_stock: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Bouquet projection with flowers, media and the resolved display image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BouquetWithRelated {
    #[serde(flatten)]
    pub bouquet: BouquetSummary,
    pub flowers: Vec<BouquetFlower>,
    pub media: Vec<MediaItem>,
    pub thumbnail: Option<MediaItem>,
    pub image: Option<String>,
}

/// Bouquet list payload; the shape depends on whether related entities were requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BouquetList {
    WithRelated(Vec<BouquetWithRelated>),
    Plain(Vec<BouquetSummary>),
}

impl BouquetList {
    pub fn len(&self) -> usize {
        match self {
            BouquetList::WithRelated(items) => items.len(),
            BouquetList::Plain(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryView {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowerView {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub price_cents: i64,
    pub in_stock: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagView {
    pub id: Uuid,
    pub name: String,
}

// ============================================================================
// Admin writes
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BouquetFlowerInput {
    pub flower_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaInput {
    pub url: String,
    pub kind: MediaKind,
    #[serde(default)]
    pub is_thumbnail: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BouquetWriteRequest {
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
    /// Replaces the bouquet composition when present.
    pub flowers: Option<Vec<BouquetFlowerInput>>,
    /// Replaces the bouquet media when present.
    pub media: Option<Vec<MediaInput>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BouquetTagsRequest {
    pub tag_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryWriteRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowerWriteRequest {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub price_cents: i64,
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagWriteRequest {
    pub name: String,
}

fn default_in_stock() -> bool {
    true
}

// ============================================================================
// Cache administration
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvalidateCacheRequest {
    #[serde(default)]
    pub keys: Option<Vec<String>>,
    #[serde(default)]
    pub patterns: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InvalidationResult {
    Keys { count: usize },
    Pattern { pattern: String, count: usize },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvalidateCacheResponse {
    pub success: bool,
    pub results: Vec<InvalidationResult>,
}

// ============================================================================
// Custom bouquet quote
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteItem {
    pub flower_id: Uuid,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub items: Vec<QuoteItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteLine {
    pub flower_id: Uuid,
    pub name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteResponse {
    pub lines: Vec<QuoteLine>,
    pub total_cents: i64,
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}
