use std::sync::Arc;

use crate::application::admin::AdminCatalogService;
use crate::application::auth::AuthService;
use crate::application::catalog::CatalogService;
use crate::application::quote::QuoteService;
use crate::cache::CacheTrigger;
use crate::infra::db::PostgresRepositories;

#[derive(Clone)]
pub struct ApiState {
    pub catalog: CatalogService,
    pub quote: QuoteService,
    pub admin: AdminCatalogService,
    pub auth: AuthService,
    pub cache: CacheTrigger,
    /// Absent when the router is driven by in-memory repositories.
    pub db: Option<Arc<PostgresRepositories>>,
}
