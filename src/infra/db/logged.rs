//! Query logging around the catalog read repository.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use metrics::histogram;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    application::repos::{BouquetFilter, CatalogRepo, RepoError},
    domain::entities::{
        BouquetFlowerRecord, BouquetMediaRecord, BouquetRecord, CategoryRecord, FlowerRecord,
        TagRecord,
    },
};

const METRIC_DB_QUERY_MS: &str = "florista_db_query_ms";

/// Wraps a [`CatalogRepo`] and records the duration and outcome of each call.
#[derive(Clone)]
pub struct LoggedCatalogRepo {
    inner: Arc<dyn CatalogRepo>,
}

impl LoggedCatalogRepo {
    pub fn new(inner: Arc<dyn CatalogRepo>) -> Self {
        Self { inner }
    }
}

async fn observe<T, F>(query: &'static str, fut: F) -> Result<T, RepoError>
where
    F: Future<Output = Result<T, RepoError>>,
{
    let started_at = Instant::now();
    let result = fut.await;
    let elapsed_ms = started_at.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_DB_QUERY_MS, "query" => query).record(elapsed_ms);

    match &result {
        Ok(_) => debug!(query, elapsed_ms, "Catalog query finished"),
        Err(err) => warn!(query, elapsed_ms, error = %err, "Catalog query failed"),
    }
    result
}

#[async_trait]
impl CatalogRepo for LoggedCatalogRepo {
    async fn list_bouquets(&self, filter: &BouquetFilter) -> Result<Vec<BouquetRecord>, RepoError> {
        observe("list_bouquets", self.inner.list_bouquets(filter)).await
    }

    async fn find_bouquet(&self, id: Uuid) -> Result<Option<BouquetRecord>, RepoError> {
        observe("find_bouquet", self.inner.find_bouquet(id)).await
    }

    async fn list_bouquet_flowers(
        &self,
        bouquet_ids: &[Uuid],
    ) -> Result<Vec<BouquetFlowerRecord>, RepoError> {
        observe(
            "list_bouquet_flowers",
            self.inner.list_bouquet_flowers(bouquet_ids),
        )
        .await
    }

    async fn list_bouquet_media(
        &self,
        bouquet_ids: &[Uuid],
    ) -> Result<Vec<BouquetMediaRecord>, RepoError> {
        observe("list_bouquet_media", self.inner.list_bouquet_media(bouquet_ids)).await
    }

    async fn list_bouquet_tags(&self, bouquet_id: Uuid) -> Result<Vec<TagRecord>, RepoError> {
        observe("list_bouquet_tags", self.inner.list_bouquet_tags(bouquet_id)).await
    }

    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, RepoError> {
        observe("list_categories", self.inner.list_categories()).await
    }

    async fn find_category(&self, id: Uuid) -> Result<Option<CategoryRecord>, RepoError> {
        observe("find_category", self.inner.find_category(id)).await
    }

    async fn list_flowers(&self) -> Result<Vec<FlowerRecord>, RepoError> {
        observe("list_flowers", self.inner.list_flowers()).await
    }

    async fn find_flower(&self, id: Uuid) -> Result<Option<FlowerRecord>, RepoError> {
        observe("find_flower", self.inner.find_flower(id)).await
    }

    async fn list_tags(&self) -> Result<Vec<TagRecord>, RepoError> {
        observe("list_tags", self.inner.list_tags()).await
    }
}
