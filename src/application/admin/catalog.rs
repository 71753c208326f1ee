use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use florista_api_types::{
    BouquetSummary, BouquetTagsRequest, BouquetWriteRequest, CategoryView, CategoryWriteRequest,
    FlowerView, FlowerWriteRequest, TagView, TagWriteRequest,
};

use crate::application::repos::{
    BouquetFlowerParams, BouquetMediaParams, BouquetParams, CatalogWriteRepo, CategoryParams,
    FlowerParams, RepoError, TagParams,
};
use crate::cache::CacheTrigger;
use crate::domain::error::DomainError;

#[derive(Debug, Error)]
pub enum AdminCatalogError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Catalog writes for the back-office.
///
/// Every successful write is followed by cache invalidation before the
/// method returns; a failed write leaves the cache untouched.
#[derive(Clone)]
pub struct AdminCatalogService {
    writer: Arc<dyn CatalogWriteRepo>,
    trigger: CacheTrigger,
}

impl AdminCatalogService {
    pub fn new(writer: Arc<dyn CatalogWriteRepo>, trigger: CacheTrigger) -> Self {
        Self { writer, trigger }
    }

    pub async fn create_bouquet(
        &self,
        actor: Uuid,
        request: BouquetWriteRequest,
    ) -> Result<BouquetSummary, AdminCatalogError> {
        let params = bouquet_params(request)?;
        let bouquet = self.writer.create_bouquet(params).await?;
        info!(%actor, bouquet_id = %bouquet.id, "bouquet.create");
        self.trigger.bouquet_upserted(bouquet.id).await;
        Ok(bouquet.into())
    }

    pub async fn update_bouquet(
        &self,
        actor: Uuid,
        id: Uuid,
        request: BouquetWriteRequest,
    ) -> Result<BouquetSummary, AdminCatalogError> {
        let params = bouquet_params(request)?;
        let bouquet = self.writer.update_bouquet(id, params).await?;
        info!(%actor, bouquet_id = %id, "bouquet.update");
        self.trigger.bouquet_upserted(id).await;
        Ok(bouquet.into())
    }

    pub async fn delete_bouquet(&self, actor: Uuid, id: Uuid) -> Result<(), AdminCatalogError> {
        self.writer.delete_bouquet(id).await?;
        info!(%actor, bouquet_id = %id, "bouquet.delete");
        self.trigger.bouquet_deleted(id).await;
        Ok(())
    }

    pub async fn replace_bouquet_tags(
        &self,
        actor: Uuid,
        id: Uuid,
        request: BouquetTagsRequest,
    ) -> Result<(), AdminCatalogError> {
        let mut seen = HashSet::new();
        let tag_ids: Vec<Uuid> = request
            .tag_ids
            .into_iter()
            .filter(|tag_id| seen.insert(*tag_id))
            .collect();

        self.writer.replace_bouquet_tags(id, &tag_ids).await?;
        info!(%actor, bouquet_id = %id, tags = tag_ids.len(), "bouquet.tags.replace");
        self.trigger.bouquet_tags_replaced(id).await;
        Ok(())
    }

    pub async fn create_category(
        &self,
        actor: Uuid,
        request: CategoryWriteRequest,
    ) -> Result<CategoryView, AdminCatalogError> {
        let params = category_params(request)?;
        let category = self.writer.create_category(params).await?;
        info!(%actor, category_id = %category.id, "category.create");
        self.trigger.category_upserted(category.id).await;
        Ok(category.into())
    }

    pub async fn update_category(
        &self,
        actor: Uuid,
        id: Uuid,
        request: CategoryWriteRequest,
    ) -> Result<CategoryView, AdminCatalogError> {
        let params = category_params(request)?;
        let category = self.writer.update_category(id, params).await?;
        info!(%actor, category_id = %id, "category.update");
        self.trigger.category_upserted(id).await;
        Ok(category.into())
    }

    pub async fn delete_category(&self, actor: Uuid, id: Uuid) -> Result<(), AdminCatalogError> {
        self.writer.delete_category(id).await?;
        info!(%actor, category_id = %id, "category.delete");
        self.trigger.category_deleted(id).await;
        Ok(())
    }

    pub async fn create_flower(
        &self,
        actor: Uuid,
        request: FlowerWriteRequest,
    ) -> Result<FlowerView, AdminCatalogError> {
        let params = flower_params(request)?;
        let flower = self.writer.create_flower(params).await?;
        info!(%actor, flower_id = %flower.id, "flower.create");
        self.trigger.flower_upserted(flower.id).await;
        Ok(flower.into())
    }

    pub async fn update_flower(
        &self,
        actor: Uuid,
        id: Uuid,
        request: FlowerWriteRequest,
    ) -> Result<FlowerView, AdminCatalogError> {
        let params = flower_params(request)?;
        let flower = self.writer.update_flower(id, params).await?;
        info!(%actor, flower_id = %id, "flower.update");
        self.trigger.flower_upserted(id).await;
        Ok(flower.into())
    }

    pub async fn delete_flower(&self, actor: Uuid, id: Uuid) -> Result<(), AdminCatalogError> {
        self.writer.delete_flower(id).await?;
        info!(%actor, flower_id = %id, "flower.delete");
        self.trigger.flower_deleted(id).await;
        Ok(())
    }

    pub async fn create_tag(
        &self,
        actor: Uuid,
        request: TagWriteRequest,
    ) -> Result<TagView, AdminCatalogError> {
        let params = TagParams {
            name: required(request.name, "name")?,
        };
        let tag = self.writer.create_tag(params).await?;
        info!(%actor, tag_id = %tag.id, "tag.create");
        self.trigger.tag_upserted(tag.id).await;
        Ok(tag.into())
    }

    pub async fn update_tag(
        &self,
        actor: Uuid,
        id: Uuid,
        request: TagWriteRequest,
    ) -> Result<TagView, AdminCatalogError> {
        let params = TagParams {
            name: required(request.name, "name")?,
        };
        let tag = self.writer.update_tag(id, params).await?;
        info!(%actor, tag_id = %id, "tag.update");
        self.trigger.tag_upserted(id).await;
        Ok(tag.into())
    }

    pub async fn delete_tag(&self, actor: Uuid, id: Uuid) -> Result<(), AdminCatalogError> {
        self.writer.delete_tag(id).await?;
        info!(%actor, tag_id = %id, "tag.delete");
        self.trigger.tag_deleted(id).await;
        Ok(())
    }
}

fn required(value: String, field: &str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("`{field}` must not be empty")));
    }
    Ok(trimmed.to_string())
}

fn optional(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn price(value: i64) -> Result<i64, DomainError> {
    if value < 0 {
        return Err(DomainError::validation("`price_cents` must not be negative"));
    }
    Ok(value)
}

fn bouquet_params(request: BouquetWriteRequest) -> Result<BouquetParams, DomainError> {
    let flowers = request
        .flowers
        .map(|flowers| {
            let mut seen = HashSet::new();
            flowers
                .into_iter()
                .map(|line| {
                    if line.quantity <= 0 {
                        return Err(DomainError::validation(
                            "flower quantities must be positive",
                        ));
                    }
                    if !seen.insert(line.flower_id) {
                        return Err(DomainError::validation(format!(
                            "flower `{}` is listed twice",
                            line.flower_id
                        )));
                    }
                    Ok(BouquetFlowerParams {
                        flower_id: line.flower_id,
                        quantity: line.quantity,
                    })
                })
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()?;

    let media = request
        .media
        .map(|media| {
            if media.iter().filter(|item| item.is_thumbnail).count() > 1 {
                return Err(DomainError::validation(
                    "at most one media item can be the thumbnail",
                ));
            }
            media
                .into_iter()
                .map(|item| {
                    Ok(BouquetMediaParams {
                        url: required(item.url, "media.url")?,
                        kind: item.kind,
                        is_thumbnail: item.is_thumbnail,
                    })
                })
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()?;

    Ok(BouquetParams {
        name: required(request.name, "name")?,
        description: optional(request.description),
        price_cents: price(request.price_cents)?,
        category_id: request.category_id,
        featured: request.featured,
        in_stock: request.in_stock,
        flowers,
        media,
    })
}

fn category_params(request: CategoryWriteRequest) -> Result<CategoryParams, DomainError> {
    Ok(CategoryParams {
        name: required(request.name, "name")?,
        description: optional(request.description),
    })
}

fn flower_params(request: FlowerWriteRequest) -> Result<FlowerParams, DomainError> {
    Ok(FlowerParams {
        name: required(request.name, "name")?,
        description: optional(request.description),
        color: optional(request.color),
        price_cents: price(request.price_cents)?,
        in_stock: request.in_stock,
    })
}
