//! Public catalog handlers

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use serde::Deserialize;
use uuid::Uuid;

use crate::application::catalog::BouquetListQuery;

use super::catalog_to_api;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::state::ApiState;

/// Raw query string of `GET /api/bouquets`.
#[derive(Debug, Default, Deserialize)]
pub struct BouquetListParams {
    pub featured: Option<String>,
    pub category: Option<String>,
    pub limit: Option<String>,
    #[serde(rename = "withFlowers")]
    pub with_flowers: Option<String>,
}

impl BouquetListParams {
    fn into_query(self) -> Result<BouquetListQuery, ApiError> {
        let category = match non_empty(self.category) {
            Some(raw) => Some(
                Uuid::parse_str(&raw)
                    .map_err(|err| ApiError::bad_request("invalid category", Some(err.to_string())))?,
            ),
            None => None,
        };

        let limit = match non_empty(self.limit) {
            Some(raw) => Some(
                raw.parse::<u32>()
                    .map_err(|err| ApiError::bad_request("invalid limit", Some(err.to_string())))?,
            ),
            None => None,
        };

        Ok(BouquetListQuery {
            featured: flag(self.featured.as_deref(), false),
            category,
            limit,
            with_flowers: flag(self.with_flowers.as_deref(), true),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn flag(value: Option<&str>, default: bool) -> bool {
    match value.map(str::trim) {
        Some("true") | Some("1") => true,
        Some("false") | Some("0") => false,
        _ => default,
    }
}

pub async fn list_bouquets(
    State(state): State<ApiState>,
    Query(params): Query<BouquetListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let query = params.into_query()?;
    let bouquets = state
        .catalog
        .list_bouquets(query)
        .await
        .map_err(catalog_to_api)?;
    Ok(Json(bouquets))
}

pub async fn get_bouquet(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let bouquet = state.catalog.bouquet(id).await.map_err(catalog_to_api)?;
    Ok(Json(bouquet))
}

pub async fn get_bouquet_tags(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let tags = state
        .catalog
        .bouquet_tags(id)
        .await
        .map_err(catalog_to_api)?;
    Ok(Json(tags))
}

pub async fn list_categories(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let categories = state.catalog.categories().await.map_err(catalog_to_api)?;
    Ok(Json(categories))
}

pub async fn get_category(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let category = state.catalog.category(id).await.map_err(catalog_to_api)?;
    Ok(Json(category))
}

pub async fn get_category_bouquets(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let bouquets = state
        .catalog
        .category_bouquets(id)
        .await
        .map_err(catalog_to_api)?;
    Ok(Json(bouquets))
}

pub async fn list_flowers(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let flowers = state.catalog.flowers().await.map_err(catalog_to_api)?;
    Ok(Json(flowers))
}

pub async fn get_flower(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let flower = state.catalog.flower(id).await.map_err(catalog_to_api)?;
    Ok(Json(flower))
}

pub async fn list_tags(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let tags = state.catalog.tags().await.map_err(catalog_to_api)?;
    Ok(Json(tags))
}
