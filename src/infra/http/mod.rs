pub mod api;
mod middleware;

pub use api::ApiState;
pub use middleware::RequestContext;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use sqlx::Error as SqlxError;

use crate::application::error::ErrorReport;

/// Assemble the full HTTP surface: health probes, public reads, admin writes.
pub fn build_router(state: ApiState) -> Router {
    let health = Router::new()
        .route("/_health", get(liveness))
        .route("/_health/db", get(db_health))
        .with_state(state.clone());

    Router::new()
        .merge(health)
        .merge(api::build_public_router(state.clone()))
        .merge(api::build_admin_router(state))
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .layer(axum_middleware::from_fn(middleware::set_request_context))
}

async fn liveness() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn db_health(State(state): State<ApiState>) -> Response {
    match state.db.as_ref() {
        Some(db) => db_health_response(db.health_check().await),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

fn db_health_response(result: Result<(), SqlxError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}
