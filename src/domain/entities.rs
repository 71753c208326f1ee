//! Domain entities mirrored from persistent storage.

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::types::{MediaKind, UserRole};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRecord {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowerRecord {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub price_cents: i64,
    pub in_stock: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagRecord {
    pub id: Uuid,
    pub name: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BouquetRecord {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub category_id: Option<Uuid>,
    pub featured: bool,
    pub in_stock: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// A flower line of a bouquet, joined with the flower it references.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BouquetFlowerRecord {
    pub bouquet_id: Uuid,
    pub flower_id: Uuid,
    pub name: String,
    pub color: Option<String>,
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BouquetMediaRecord {
    pub id: Uuid,
    pub bouquet_id: Uuid,
    pub url: String,
    pub kind: MediaKind,
    pub is_thumbnail: bool,
    pub position: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub id: Uuid,
    pub prefix: String,
    pub user_id: Uuid,
    pub token_hash: Vec<u8>,
    pub expires_at: OffsetDateTime,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileRecord {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
}
