use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;

use florista_api_types::QuoteRequest;

use super::quote_to_api;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::state::ApiState;

pub async fn custom_bouquet_quote(
    State(state): State<ApiState>,
    Json(payload): Json<QuoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let quote = state.quote.quote(&payload).await.map_err(quote_to_api)?;
    Ok(Json(quote))
}
