pub mod error;
pub mod handlers;
pub mod middleware;
pub mod state;

pub use state::ApiState;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post, put},
};

/// Public catalog reads and the custom bouquet quote.
pub fn build_public_router(state: ApiState) -> Router {
    Router::new()
        .route("/api/bouquets", get(handlers::list_bouquets))
        .route("/api/bouquets/{id}", get(handlers::get_bouquet))
        .route("/api/bouquets/{id}/tags", get(handlers::get_bouquet_tags))
        .route("/api/categories", get(handlers::list_categories))
        .route("/api/categories/{id}", get(handlers::get_category))
        .route(
            "/api/categories/{id}/bouquets",
            get(handlers::get_category_bouquets),
        )
        .route("/api/flowers", get(handlers::list_flowers))
        .route("/api/flowers/{id}", get(handlers::get_flower))
        .route("/api/tags", get(handlers::list_tags))
        .route(
            "/api/custom-bouquet/quote",
            post(handlers::custom_bouquet_quote),
        )
        .with_state(state)
}

/// Catalog writes and cache administration; every route requires an admin session.
pub fn build_admin_router(state: ApiState) -> Router {
    let auth_state = state.clone();

    Router::new()
        .route("/api/admin/bouquets", post(handlers::create_bouquet))
        .route(
            "/api/admin/bouquets/{id}",
            put(handlers::update_bouquet).delete(handlers::delete_bouquet),
        )
        .route(
            "/api/admin/bouquets/{id}/tags",
            put(handlers::replace_bouquet_tags),
        )
        .route("/api/admin/categories", post(handlers::create_category))
        .route(
            "/api/admin/categories/{id}",
            put(handlers::update_category).delete(handlers::delete_category),
        )
        .route("/api/admin/flowers", post(handlers::create_flower))
        .route(
            "/api/admin/flowers/{id}",
            put(handlers::update_flower).delete(handlers::delete_flower),
        )
        .route("/api/admin/tags", post(handlers::create_tag))
        .route(
            "/api/admin/tags/{id}",
            put(handlers::update_tag).delete(handlers::delete_tag),
        )
        .route("/api/cache/invalidate", post(handlers::invalidate_cache))
        .route_layer(axum_middleware::from_fn_with_state(
            auth_state,
            middleware::admin_auth,
        ))
        .with_state(state)
}
