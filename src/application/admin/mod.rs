//! Application services for the administrative surface.

pub mod catalog;

pub use catalog::{AdminCatalogError, AdminCatalogService};
