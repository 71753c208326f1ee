use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::repos::{BouquetFilter, CatalogRepo, RepoError},
    domain::{
        entities::{
            BouquetFlowerRecord, BouquetMediaRecord, BouquetRecord, CategoryRecord, FlowerRecord,
            TagRecord,
        },
        types::parse_media_kind,
    },
};

use super::{PostgresRepositories, map_sqlx_error};

pub(super) const BOUQUET_COLUMNS: &str = "id, name, description, price_cents, category_id, featured, in_stock, created_at, updated_at";

#[derive(sqlx::FromRow)]
pub(super) struct BouquetRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    price_cents: i64,
    category_id: Option<Uuid>,
    featured: bool,
    in_stock: bool,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<BouquetRow> for BouquetRecord {
    fn from(row: BouquetRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            price_cents: row.price_cents,
            category_id: row.category_id,
            featured: row.featured,
            in_stock: row.in_stock,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct CategoryRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<CategoryRow> for CategoryRecord {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct FlowerRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    color: Option<String>,
    price_cents: i64,
    in_stock: bool,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<FlowerRow> for FlowerRecord {
    fn from(row: FlowerRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            color: row.color,
            price_cents: row.price_cents,
            in_stock: row.in_stock,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct TagRow {
    id: Uuid,
    name: String,
    created_at: OffsetDateTime,
}

impl From<TagRow> for TagRecord {
    fn from(row: TagRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct BouquetFlowerRow {
    bouquet_id: Uuid,
    flower_id: Uuid,
    name: String,
    color: Option<String>,
    quantity: i32,
}

#[derive(sqlx::FromRow)]
struct BouquetMediaRow {
    id: Uuid,
    bouquet_id: Uuid,
    url: String,
    kind: String,
    is_thumbnail: bool,
    position: i32,
}

impl TryFrom<BouquetMediaRow> for BouquetMediaRecord {
    type Error = RepoError;

    fn try_from(row: BouquetMediaRow) -> Result<Self, Self::Error> {
        let kind = parse_media_kind(&row.kind).ok_or_else(|| RepoError::Integrity {
            message: format!("unknown media kind `{}` on media {}", row.kind, row.id),
        })?;
        Ok(Self {
            id: row.id,
            bouquet_id: row.bouquet_id,
            url: row.url,
            kind,
            is_thumbnail: row.is_thumbnail,
            position: row.position,
        })
    }
}

/// Builds the filtered bouquet listing, newest first.
fn bouquet_list_query(filter: &BouquetFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {BOUQUET_COLUMNS} FROM bouquets WHERE TRUE"));
    if filter.featured {
        qb.push(" AND featured = TRUE");
    }
    if let Some(category_id) = filter.category_id {
        qb.push(" AND category_id = ").push_bind(category_id);
    }
    qb.push(" ORDER BY created_at DESC, id");
    if let Some(limit) = filter.limit {
        qb.push(" LIMIT ").push_bind(i64::from(limit));
    }
    qb
}

#[async_trait]
impl CatalogRepo for PostgresRepositories {
    async fn list_bouquets(&self, filter: &BouquetFilter) -> Result<Vec<BouquetRecord>, RepoError> {
        let rows = bouquet_list_query(filter)
            .build_query_as::<BouquetRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(BouquetRecord::from).collect())
    }

    async fn find_bouquet(&self, id: Uuid) -> Result<Option<BouquetRecord>, RepoError> {
        let row = sqlx::query_as::<_, BouquetRow>(&format!(
            "SELECT {BOUQUET_COLUMNS} FROM bouquets WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(BouquetRecord::from))
    }

    async fn list_bouquet_flowers(
        &self,
        bouquet_ids: &[Uuid],
    ) -> Result<Vec<BouquetFlowerRecord>, RepoError> {
        if bouquet_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, BouquetFlowerRow>(
            r#"
            SELECT bf.bouquet_id, bf.flower_id, f.name, f.color, bf.quantity
            FROM bouquet_flowers bf
            INNER JOIN flowers f ON f.id = bf.flower_id
            WHERE bf.bouquet_id = ANY($1)
            ORDER BY bf.bouquet_id, f.name, bf.flower_id
            "#,
        )
        .bind(bouquet_ids)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|row| BouquetFlowerRecord {
                bouquet_id: row.bouquet_id,
                flower_id: row.flower_id,
                name: row.name,
                color: row.color,
                quantity: row.quantity,
            })
            .collect())
    }

    async fn list_bouquet_media(
        &self,
        bouquet_ids: &[Uuid],
    ) -> Result<Vec<BouquetMediaRecord>, RepoError> {
        if bouquet_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, BouquetMediaRow>(
            r#"
            SELECT id, bouquet_id, url, kind, is_thumbnail, position
            FROM bouquet_media
            WHERE bouquet_id = ANY($1)
            ORDER BY bouquet_id, position, id
            "#,
        )
        .bind(bouquet_ids)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(BouquetMediaRecord::try_from).collect()
    }

    async fn list_bouquet_tags(&self, bouquet_id: Uuid) -> Result<Vec<TagRecord>, RepoError> {
        let rows = sqlx::query_as::<_, TagRow>(
            r#"
            SELECT t.id, t.name, t.created_at
            FROM tags t
            INNER JOIN bouquet_tags bt ON bt.tag_id = t.id
            WHERE bt.bouquet_id = $1
            ORDER BY t.name ASC
            "#,
        )
        .bind(bouquet_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(TagRecord::from).collect())
    }

    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, RepoError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            r#"
            SELECT id, name, description, created_at, updated_at
            FROM categories
            ORDER BY LOWER(name), id
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(CategoryRecord::from).collect())
    }

    async fn find_category(&self, id: Uuid) -> Result<Option<CategoryRecord>, RepoError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r#"
            SELECT id, name, description, created_at, updated_at
            FROM categories
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(CategoryRecord::from))
    }

    async fn list_flowers(&self) -> Result<Vec<FlowerRecord>, RepoError> {
        let rows = sqlx::query_as::<_, FlowerRow>(
            r#"
            SELECT id, name, description, color, price_cents, in_stock, created_at, updated_at
            FROM flowers
            ORDER BY LOWER(name), id
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(FlowerRecord::from).collect())
    }

    async fn find_flower(&self, id: Uuid) -> Result<Option<FlowerRecord>, RepoError> {
        let row = sqlx::query_as::<_, FlowerRow>(
            r#"
            SELECT id, name, description, color, price_cents, in_stock, created_at, updated_at
            FROM flowers
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(FlowerRecord::from))
    }

    async fn list_tags(&self) -> Result<Vec<TagRecord>, RepoError> {
        let rows = sqlx::query_as::<_, TagRow>(
            r#"
            SELECT id, name, created_at
            FROM tags
            ORDER BY LOWER(name), id
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(TagRecord::from).collect())
    }
}
