use async_trait::async_trait;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::{
    application::repos::{
        BouquetFlowerParams, BouquetMediaParams, BouquetParams, CatalogWriteRepo, CategoryParams,
        FlowerParams, RepoError, TagParams,
    },
    domain::entities::{BouquetRecord, CategoryRecord, FlowerRecord, TagRecord},
};

use super::{
    PostgresRepositories,
    catalog::{BOUQUET_COLUMNS, BouquetRow, CategoryRow, FlowerRow, TagRow},
    map_sqlx_error,
    util::expect_affected,
};

async fn replace_flowers(
    tx: &mut Transaction<'_, Postgres>,
    bouquet_id: Uuid,
    flowers: &[BouquetFlowerParams],
) -> Result<(), RepoError> {
    sqlx::query("DELETE FROM bouquet_flowers WHERE bouquet_id = $1")
        .bind(bouquet_id)
        .execute(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;

    for line in flowers {
        sqlx::query(
            r#"
            INSERT INTO bouquet_flowers (bouquet_id, flower_id, quantity)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(bouquet_id)
        .bind(line.flower_id)
        .bind(line.quantity)
        .execute(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;
    }

    Ok(())
}

async fn replace_media(
    tx: &mut Transaction<'_, Postgres>,
    bouquet_id: Uuid,
    media: &[BouquetMediaParams],
) -> Result<(), RepoError> {
    sqlx::query("DELETE FROM bouquet_media WHERE bouquet_id = $1")
        .bind(bouquet_id)
        .execute(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;

    for (position, item) in media.iter().enumerate() {
        let position = i32::try_from(position).map_err(|_| RepoError::InvalidInput {
            message: "too many media items".to_string(),
        })?;
        sqlx::query(
            r#"
            INSERT INTO bouquet_media (id, bouquet_id, url, kind, is_thumbnail, position)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(bouquet_id)
        .bind(&item.url)
        .bind(item.kind.as_str())
        .bind(item.is_thumbnail)
        .bind(position)
        .execute(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;
    }

    Ok(())
}

async fn replace_relations(
    tx: &mut Transaction<'_, Postgres>,
    bouquet_id: Uuid,
    params: &BouquetParams,
) -> Result<(), RepoError> {
    if let Some(flowers) = params.flowers.as_deref() {
        replace_flowers(tx, bouquet_id, flowers).await?;
    }
    if let Some(media) = params.media.as_deref() {
        replace_media(tx, bouquet_id, media).await?;
    }
    Ok(())
}

#[async_trait]
impl CatalogWriteRepo for PostgresRepositories {
    async fn create_bouquet(&self, params: BouquetParams) -> Result<BouquetRecord, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let row = sqlx::query_as::<_, BouquetRow>(&format!(
            r#"
            INSERT INTO bouquets (id, name, description, price_cents, category_id, featured, in_stock)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {BOUQUET_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&params.name)
        .bind(params.description.as_deref())
        .bind(params.price_cents)
        .bind(params.category_id)
        .bind(params.featured)
        .bind(params.in_stock)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        let record = BouquetRecord::from(row);
        replace_relations(&mut tx, record.id, &params).await?;
        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(record)
    }

    async fn update_bouquet(
        &self,
        id: Uuid,
        params: BouquetParams,
    ) -> Result<BouquetRecord, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let row = sqlx::query_as::<_, BouquetRow>(&format!(
            r#"
            UPDATE bouquets
            SET name = $2,
                description = $3,
                price_cents = $4,
                category_id = $5,
                featured = $6,
                in_stock = $7,
                updated_at = now()
            WHERE id = $1
            RETURNING {BOUQUET_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&params.name)
        .bind(params.description.as_deref())
        .bind(params.price_cents)
        .bind(params.category_id)
        .bind(params.featured)
        .bind(params.in_stock)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_error)?
        .ok_or(RepoError::NotFound)?;

        replace_relations(&mut tx, id, &params).await?;
        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(BouquetRecord::from(row))
    }

    async fn delete_bouquet(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM bouquets WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        expect_affected(result.rows_affected())
    }

    async fn replace_bouquet_tags(&self, id: Uuid, tag_ids: &[Uuid]) -> Result<(), RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM bouquets WHERE id = $1)",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;
        if !exists {
            return Err(RepoError::NotFound);
        }

        sqlx::query("DELETE FROM bouquet_tags WHERE bouquet_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        if !tag_ids.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO bouquet_tags (bouquet_id, tag_id)
                SELECT $1, tag_id FROM UNNEST($2::uuid[]) AS t(tag_id)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(id)
            .bind(tag_ids)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        }

        tx.commit().await.map_err(map_sqlx_error)
    }

    async fn create_category(&self, params: CategoryParams) -> Result<CategoryRecord, RepoError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r#"
            INSERT INTO categories (id, name, description)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&params.name)
        .bind(params.description.as_deref())
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(CategoryRecord::from(row))
    }

    async fn update_category(
        &self,
        id: Uuid,
        params: CategoryParams,
    ) -> Result<CategoryRecord, RepoError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r#"
            UPDATE categories
            SET name = $2, description = $3, updated_at = now()
            WHERE id = $1
            RETURNING id, name, description, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&params.name)
        .bind(params.description.as_deref())
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?
        .ok_or(RepoError::NotFound)?;

        Ok(CategoryRecord::from(row))
    }

    async fn delete_category(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        expect_affected(result.rows_affected())
    }

    async fn create_flower(&self, params: FlowerParams) -> Result<FlowerRecord, RepoError> {
        let row = sqlx::query_as::<_, FlowerRow>(
            r#"
            INSERT INTO flowers (id, name, description, color, price_cents, in_stock)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, description, color, price_cents, in_stock, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&params.name)
        .bind(params.description.as_deref())
        .bind(params.color.as_deref())
        .bind(params.price_cents)
        .bind(params.in_stock)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(FlowerRecord::from(row))
    }

    async fn update_flower(
        &self,
        id: Uuid,
        params: FlowerParams,
    ) -> Result<FlowerRecord, RepoError> {
        let row = sqlx::query_as::<_, FlowerRow>(
            r#"
            UPDATE flowers
            SET name = $2,
                description = $3,
                color = $4,
                price_cents = $5,
                in_stock = $6,
                updated_at = now()
            WHERE id = $1
            RETURNING id, name, description, color, price_cents, in_stock, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&params.name)
        .bind(params.description.as_deref())
        .bind(params.color.as_deref())
        .bind(params.price_cents)
        .bind(params.in_stock)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?
        .ok_or(RepoError::NotFound)?;

        Ok(FlowerRecord::from(row))
    }

    async fn delete_flower(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM flowers WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        expect_affected(result.rows_affected())
    }

    async fn create_tag(&self, params: TagParams) -> Result<TagRecord, RepoError> {
        let row = sqlx::query_as::<_, TagRow>(
            r#"
            INSERT INTO tags (id, name)
            VALUES ($1, $2)
            RETURNING id, name, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&params.name)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(TagRecord::from(row))
    }

    async fn update_tag(&self, id: Uuid, params: TagParams) -> Result<TagRecord, RepoError> {
        let row = sqlx::query_as::<_, TagRow>(
            r#"
            UPDATE tags
            SET name = $2
            WHERE id = $1
            RETURNING id, name, created_at
            "#,
        )
        .bind(id)
        .bind(&params.name)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?
        .ok_or(RepoError::NotFound)?;

        Ok(TagRecord::from(row))
    }

    async fn delete_tag(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        expect_affected(result.rows_affected())
    }
}
