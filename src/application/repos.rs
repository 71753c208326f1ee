//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::entities::{
    BouquetFlowerRecord, BouquetMediaRecord, BouquetRecord, CategoryRecord, FlowerRecord,
    ProfileRecord, SessionRecord, TagRecord,
};
use crate::domain::types::MediaKind;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Filters applied to the public bouquet listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BouquetFilter {
    pub featured: bool,
    pub category_id: Option<Uuid>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct BouquetFlowerParams {
    pub flower_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone)]
pub struct BouquetMediaParams {
    pub url: String,
    pub kind: MediaKind,
    pub is_thumbnail: bool,
}

#[derive(Debug, Clone)]
pub struct BouquetParams {
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub category_id: Option<Uuid>,
    pub featured: bool,
    pub in_stock: bool,
    /// Replaces the composition when present.
    pub flowers: Option<Vec<BouquetFlowerParams>>,
    /// Replaces the media when present; positions follow list order.
    pub media: Option<Vec<BouquetMediaParams>>,
}

#[derive(Debug, Clone)]
pub struct CategoryParams {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FlowerParams {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub price_cents: i64,
    pub in_stock: bool,
}

#[derive(Debug, Clone)]
pub struct TagParams {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct CreateSessionParams {
    pub user_id: Uuid,
    pub prefix: String,
    pub token_hash: Vec<u8>,
    pub expires_at: OffsetDateTime,
}

/// Read side of the catalog.
///
/// Related entities are loaded per batch of parent ids so a list of N
/// bouquets costs one query per relation, not N.
#[async_trait]
pub trait CatalogRepo: Send + Sync {
    async fn list_bouquets(&self, filter: &BouquetFilter) -> Result<Vec<BouquetRecord>, RepoError>;

    async fn find_bouquet(&self, id: Uuid) -> Result<Option<BouquetRecord>, RepoError>;

    async fn list_bouquet_flowers(
        &self,
        bouquet_ids: &[Uuid],
    ) -> Result<Vec<BouquetFlowerRecord>, RepoError>;

    /// Media ordered by bouquet, then position.
    async fn list_bouquet_media(
        &self,
        bouquet_ids: &[Uuid],
    ) -> Result<Vec<BouquetMediaRecord>, RepoError>;

    async fn list_bouquet_tags(&self, bouquet_id: Uuid) -> Result<Vec<TagRecord>, RepoError>;

    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, RepoError>;

    async fn find_category(&self, id: Uuid) -> Result<Option<CategoryRecord>, RepoError>;

    async fn list_flowers(&self) -> Result<Vec<FlowerRecord>, RepoError>;

    async fn find_flower(&self, id: Uuid) -> Result<Option<FlowerRecord>, RepoError>;

    async fn list_tags(&self) -> Result<Vec<TagRecord>, RepoError>;
}

/// Write side of the catalog. Every method commits before returning.
#[async_trait]
pub trait CatalogWriteRepo: Send + Sync {
    async fn create_bouquet(&self, params: BouquetParams) -> Result<BouquetRecord, RepoError>;

    async fn update_bouquet(
        &self,
        id: Uuid,
        params: BouquetParams,
    ) -> Result<BouquetRecord, RepoError>;

    async fn delete_bouquet(&self, id: Uuid) -> Result<(), RepoError>;

    async fn replace_bouquet_tags(&self, id: Uuid, tag_ids: &[Uuid]) -> Result<(), RepoError>;

    async fn create_category(&self, params: CategoryParams) -> Result<CategoryRecord, RepoError>;

    async fn update_category(
        &self,
        id: Uuid,
        params: CategoryParams,
    ) -> Result<CategoryRecord, RepoError>;

    async fn delete_category(&self, id: Uuid) -> Result<(), RepoError>;

    async fn create_flower(&self, params: FlowerParams) -> Result<FlowerRecord, RepoError>;

    async fn update_flower(&self, id: Uuid, params: FlowerParams)
    -> Result<FlowerRecord, RepoError>;

    async fn delete_flower(&self, id: Uuid) -> Result<(), RepoError>;

    async fn create_tag(&self, params: TagParams) -> Result<TagRecord, RepoError>;

    async fn update_tag(&self, id: Uuid, params: TagParams) -> Result<TagRecord, RepoError>;

    async fn delete_tag(&self, id: Uuid) -> Result<(), RepoError>;
}

#[async_trait]
pub trait SessionsRepo: Send + Sync {
    async fn create_session(&self, params: CreateSessionParams)
    -> Result<SessionRecord, RepoError>;

    async fn find_session_by_prefix(&self, prefix: &str)
    -> Result<Option<SessionRecord>, RepoError>;
}

#[async_trait]
pub trait ProfilesRepo: Send + Sync {
    async fn find_profile(&self, id: Uuid) -> Result<Option<ProfileRecord>, RepoError>;
}
