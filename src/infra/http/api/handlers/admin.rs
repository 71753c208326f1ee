//! Admin catalog handlers

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use florista_api_types::{
    BouquetTagsRequest, BouquetWriteRequest, CategoryWriteRequest, FlowerWriteRequest,
    TagWriteRequest,
};

use crate::application::auth::SessionPrincipal;

use super::admin_to_api;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::state::ApiState;

pub async fn create_bouquet(
    State(state): State<ApiState>,
    Extension(principal): Extension<SessionPrincipal>,
    Json(payload): Json<BouquetWriteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let bouquet = state
        .admin
        .create_bouquet(principal.user_id, payload)
        .await
        .map_err(admin_to_api)?;
    Ok((StatusCode::CREATED, Json(bouquet)))
}

pub async fn update_bouquet(
    State(state): State<ApiState>,
    Extension(principal): Extension<SessionPrincipal>,
    Path(id): Path<Uuid>,
    Json(payload): Json<BouquetWriteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let bouquet = state
        .admin
        .update_bouquet(principal.user_id, id, payload)
        .await
        .map_err(admin_to_api)?;
    Ok(Json(bouquet))
}

pub async fn delete_bouquet(
    State(state): State<ApiState>,
    Extension(principal): Extension<SessionPrincipal>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .admin
        .delete_bouquet(principal.user_id, id)
        .await
        .map_err(admin_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn replace_bouquet_tags(
    State(state): State<ApiState>,
    Extension(principal): Extension<SessionPrincipal>,
    Path(id): Path<Uuid>,
    Json(payload): Json<BouquetTagsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .admin
        .replace_bouquet_tags(principal.user_id, id, payload)
        .await
        .map_err(admin_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_category(
    State(state): State<ApiState>,
    Extension(principal): Extension<SessionPrincipal>,
    Json(payload): Json<CategoryWriteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let category = state
        .admin
        .create_category(principal.user_id, payload)
        .await
        .map_err(admin_to_api)?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update_category(
    State(state): State<ApiState>,
    Extension(principal): Extension<SessionPrincipal>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CategoryWriteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let category = state
        .admin
        .update_category(principal.user_id, id, payload)
        .await
        .map_err(admin_to_api)?;
    Ok(Json(category))
}

pub async fn delete_category(
    State(state): State<ApiState>,
    Extension(principal): Extension<SessionPrincipal>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .admin
        .delete_category(principal.user_id, id)
        .await
        .map_err(admin_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_flower(
    State(state): State<ApiState>,
    Extension(principal): Extension<SessionPrincipal>,
    Json(payload): Json<FlowerWriteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let flower = state
        .admin
        .create_flower(principal.user_id, payload)
        .await
        .map_err(admin_to_api)?;
    Ok((StatusCode::CREATED, Json(flower)))
}

pub async fn update_flower(
    State(state): State<ApiState>,
    Extension(principal): Extension<SessionPrincipal>,
    Path(id): Path<Uuid>,
    Json(payload): Json<FlowerWriteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let flower = state
        .admin
        .update_flower(principal.user_id, id, payload)
        .await
        .map_err(admin_to_api)?;
    Ok(Json(flower))
}

pub async fn delete_flower(
    State(state): State<ApiState>,
    Extension(principal): Extension<SessionPrincipal>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .admin
        .delete_flower(principal.user_id, id)
        .await
        .map_err(admin_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_tag(
    State(state): State<ApiState>,
    Extension(principal): Extension<SessionPrincipal>,
    Json(payload): Json<TagWriteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let tag = state
        .admin
        .create_tag(principal.user_id, payload)
        .await
        .map_err(admin_to_api)?;
    Ok((StatusCode::CREATED, Json(tag)))
}

pub async fn update_tag(
    State(state): State<ApiState>,
    Extension(principal): Extension<SessionPrincipal>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TagWriteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let tag = state
        .admin
        .update_tag(principal.user_id, id, payload)
        .await
        .map_err(admin_to_api)?;
    Ok(Json(tag))
}

pub async fn delete_tag(
    State(state): State<ApiState>,
    Extension(principal): Extension<SessionPrincipal>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .admin
        .delete_tag(principal.user_id, id)
        .await
        .map_err(admin_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}
