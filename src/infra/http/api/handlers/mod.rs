pub mod admin;
pub mod cache;
pub mod catalog;
pub mod quote;

pub use admin::*;
pub use cache::*;
pub use catalog::*;
pub use quote::*;

use axum::http::StatusCode;

use crate::application::admin::AdminCatalogError;
use crate::application::auth::AuthError;
use crate::application::catalog::CatalogError;
use crate::application::quote::QuoteError;
use crate::application::repos::RepoError;
use crate::domain::error::DomainError;

use super::error::{ApiError, codes};

pub(crate) fn repo_to_api(err: RepoError) -> ApiError {
    match err {
        RepoError::Duplicate { constraint } => ApiError::new(
            StatusCode::CONFLICT,
            codes::DUPLICATE,
            "Duplicate record",
            Some(constraint),
        ),
        RepoError::NotFound => ApiError::not_found("resource not found"),
        RepoError::InvalidInput { message } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid input",
            Some(message),
        ),
        RepoError::Integrity { message } => ApiError::new(
            StatusCode::CONFLICT,
            codes::INTEGRITY,
            "Integrity constraint violated",
            Some(message),
        ),
        RepoError::Timeout => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::DB_TIMEOUT,
            "Database timeout",
            None,
        ),
        RepoError::Persistence(msg) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::REPO,
            "Persistence error",
            Some(msg),
        ),
    }
}

pub(crate) fn domain_to_api(err: DomainError) -> ApiError {
    match err {
        DomainError::NotFound { entity } => ApiError::new(
            StatusCode::NOT_FOUND,
            codes::NOT_FOUND,
            "resource not found",
            Some(format!("{entity} not found")),
        ),
        DomainError::Validation { message } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid input",
            Some(message),
        ),
    }
}

pub(crate) fn catalog_to_api(err: CatalogError) -> ApiError {
    match err {
        CatalogError::Domain(domain) => domain_to_api(domain),
        CatalogError::Repo(repo) => repo_to_api(repo),
    }
}

pub(crate) fn admin_to_api(err: AdminCatalogError) -> ApiError {
    match err {
        AdminCatalogError::Domain(domain) => domain_to_api(domain),
        AdminCatalogError::Repo(repo) => repo_to_api(repo),
    }
}

pub(crate) fn quote_to_api(err: QuoteError) -> ApiError {
    match err {
        QuoteError::Pricing(pricing) => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::QUOTE,
            "Custom bouquet cannot be priced",
            Some(pricing.to_string()),
        ),
        QuoteError::Catalog(catalog) => catalog_to_api(catalog),
    }
}

pub(crate) fn auth_to_api(err: AuthError) -> ApiError {
    match err {
        AuthError::Missing => ApiError::unauthorized("Session token required"),
        AuthError::Invalid | AuthError::UnknownUser(_) => {
            ApiError::unauthorized("Invalid session token")
        }
        AuthError::Expired => ApiError::new(
            StatusCode::UNAUTHORIZED,
            codes::EXPIRED,
            "Session expired",
            None,
        ),
        AuthError::Forbidden => ApiError::forbidden(),
        AuthError::Repo(repo) => repo_to_api(repo),
    }
}
