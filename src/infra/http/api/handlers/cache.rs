use axum::Json;
use axum::extract::{Extension, State};
use axum::response::IntoResponse;
use tracing::info;

use florista_api_types::{InvalidateCacheRequest, InvalidateCacheResponse};

use crate::application::auth::SessionPrincipal;

use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::state::ApiState;

/// Operator-driven deletion of cache keys and key patterns.
pub async fn invalidate_cache(
    State(state): State<ApiState>,
    Extension(principal): Extension<SessionPrincipal>,
    Json(payload): Json<InvalidateCacheRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let patterns = payload.patterns.unwrap_or_default();

    let results = state
        .cache
        .invalidate_requested(payload.keys.as_deref(), &patterns)
        .await;
    info!(
        actor = %principal.user_id,
        keys = payload.keys.as_ref().map_or(0, Vec::len),
        patterns = patterns.len(),
        "cache.invalidate"
    );

    Ok(Json(InvalidateCacheResponse {
        success: true,
        results,
    }))
}
