//! Public catalog reads served through the cache.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use florista_api_types::{
    BouquetList, BouquetSummary, BouquetWithRelated, CategoryView, FlowerView, TagView,
};

use crate::application::projections::assemble_bouquets;
use crate::application::repos::{BouquetFilter, CatalogRepo, RepoError};
use crate::cache::keys::{bouquet_tags_key, category_bouquets_key, detail_key, list_key};
use crate::cache::{CacheClient, ListKeyParts, Resource};
use crate::domain::entities::BouquetRecord;
use crate::domain::error::DomainError;

pub const MAX_LIST_LIMIT: u32 = 100;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl CatalogError {
    fn not_found(entity: &'static str) -> Self {
        Self::Domain(DomainError::not_found(entity))
    }
}

/// Query for the bouquet listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BouquetListQuery {
    pub featured: bool,
    pub category: Option<Uuid>,
    pub limit: Option<u32>,
    pub with_flowers: bool,
}

impl Default for BouquetListQuery {
    fn default() -> Self {
        Self {
            featured: false,
            category: None,
            limit: None,
            with_flowers: true,
        }
    }
}

impl BouquetListQuery {
    /// Limit clamped to `1..=MAX_LIST_LIMIT`.
    pub fn effective_limit(&self) -> Option<u32> {
        self.limit.map(|limit| limit.clamp(1, MAX_LIST_LIMIT))
    }

    pub fn cache_key(&self) -> String {
        list_key(
            Resource::Bouquet,
            &ListKeyParts {
                featured: self.featured,
                category: self.category,
                limit: self.effective_limit(),
                with_flowers: self.with_flowers,
            },
        )
    }

    fn filter(&self) -> BouquetFilter {
        BouquetFilter {
            featured: self.featured,
            category_id: self.category,
            limit: self.effective_limit(),
        }
    }
}

#[derive(Clone)]
pub struct CatalogService {
    repo: Arc<dyn CatalogRepo>,
    cache: Arc<CacheClient>,
}

impl CatalogService {
    pub fn new(repo: Arc<dyn CatalogRepo>, cache: Arc<CacheClient>) -> Self {
        Self { repo, cache }
    }

    pub async fn list_bouquets(&self, query: BouquetListQuery) -> Result<BouquetList, CatalogError> {
        let key = query.cache_key();
        let ttl = self.ttl(Resource::Bouquet);
        let filter = query.filter();

        if query.with_flowers {
            let items = self
                .cache
                .read_through(&key, ttl, move || async move {
                    let bouquets = self.repo.list_bouquets(&filter).await?;
                    self.with_related(bouquets).await
                })
                .await?;
            Ok(BouquetList::WithRelated(items))
        } else {
            let items = self
                .cache
                .read_through(&key, ttl, move || async move {
                    let bouquets = self.repo.list_bouquets(&filter).await?;
                    Ok::<_, CatalogError>(
                        bouquets.into_iter().map(BouquetSummary::from).collect::<Vec<_>>(),
                    )
                })
                .await?;
            Ok(BouquetList::Plain(items))
        }
    }

    /// Bouquet detail, always with flowers and media.
    pub async fn bouquet(&self, id: Uuid) -> Result<BouquetWithRelated, CatalogError> {
        let key = detail_key(Resource::Bouquet, id);
        self.cache
            .read_through_optional(&key, self.ttl(Resource::Bouquet), move || async move {
                let Some(bouquet) = self.repo.find_bouquet(id).await? else {
                    return Ok(None);
                };
                Ok::<_, CatalogError>(self.with_related(vec![bouquet]).await?.into_iter().next())
            })
            .await?
            .ok_or_else(|| CatalogError::not_found("bouquet"))
    }

    pub async fn bouquet_tags(&self, id: Uuid) -> Result<Vec<TagView>, CatalogError> {
        let key = bouquet_tags_key(id);
        self.cache
            .read_through(&key, self.ttl(Resource::Tag), move || async move {
                if self.repo.find_bouquet(id).await?.is_none() {
                    return Err(CatalogError::not_found("bouquet"));
                }
                let tags = self.repo.list_bouquet_tags(id).await?;
                Ok::<_, CatalogError>(tags.into_iter().map(TagView::from).collect::<Vec<_>>())
            })
            .await
    }

    pub async fn categories(&self) -> Result<Vec<CategoryView>, CatalogError> {
        let key = list_key(Resource::Category, &ListKeyParts::default());
        self.cache
            .read_through(&key, self.ttl(Resource::Category), move || async move {
                let categories = self.repo.list_categories().await?;
                Ok::<_, CatalogError>(
                    categories.into_iter().map(CategoryView::from).collect::<Vec<_>>(),
                )
            })
            .await
    }

    pub async fn category(&self, id: Uuid) -> Result<CategoryView, CatalogError> {
        let key = detail_key(Resource::Category, id);
        self.cache
            .read_through_optional(&key, self.ttl(Resource::Category), move || async move {
                let category = self.repo.find_category(id).await?;
                Ok::<_, CatalogError>(category.map(CategoryView::from))
            })
            .await?
            .ok_or_else(|| CatalogError::not_found("category"))
    }

    pub async fn category_bouquets(
        &self,
        id: Uuid,
    ) -> Result<Vec<BouquetWithRelated>, CatalogError> {
        let key = category_bouquets_key(id);
        self.cache
            .read_through(&key, self.ttl(Resource::Bouquet), move || async move {
                if self.repo.find_category(id).await?.is_none() {
                    return Err(CatalogError::not_found("category"));
                }
                let filter = BouquetFilter {
                    category_id: Some(id),
                    ..Default::default()
                };
                let bouquets = self.repo.list_bouquets(&filter).await?;
                self.with_related(bouquets).await
            })
            .await
    }

    pub async fn flowers(&self) -> Result<Vec<FlowerView>, CatalogError> {
        let key = list_key(Resource::Flower, &ListKeyParts::default());
        self.cache
            .read_through(&key, self.ttl(Resource::Flower), move || async move {
                let flowers = self.repo.list_flowers().await?;
                Ok::<_, CatalogError>(flowers.into_iter().map(FlowerView::from).collect::<Vec<_>>())
            })
            .await
    }

    pub async fn flower(&self, id: Uuid) -> Result<FlowerView, CatalogError> {
        let key = detail_key(Resource::Flower, id);
        self.cache
            .read_through_optional(&key, self.ttl(Resource::Flower), move || async move {
                let flower = self.repo.find_flower(id).await?;
                Ok::<_, CatalogError>(flower.map(FlowerView::from))
            })
            .await?
            .ok_or_else(|| CatalogError::not_found("flower"))
    }

    pub async fn tags(&self) -> Result<Vec<TagView>, CatalogError> {
        let key = list_key(Resource::Tag, &ListKeyParts::default());
        self.cache
            .read_through(&key, self.ttl(Resource::Tag), move || async move {
                let tags = self.repo.list_tags().await?;
                Ok::<_, CatalogError>(tags.into_iter().map(TagView::from).collect::<Vec<_>>())
            })
            .await
    }

    /// Loads flowers and media for all bouquets with one query per relation.
    async fn with_related(
        &self,
        bouquets: Vec<BouquetRecord>,
    ) -> Result<Vec<BouquetWithRelated>, CatalogError> {
        if bouquets.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = bouquets.iter().map(|bouquet| bouquet.id).collect();
        let flowers = self.repo.list_bouquet_flowers(&ids).await?;
        let media = self.repo.list_bouquet_media(&ids).await?;

        Ok(assemble_bouquets(bouquets, flowers, media))
    }

    fn ttl(&self, resource: Resource) -> std::time::Duration {
        self.cache.config().ttl_for(resource)
    }
}
