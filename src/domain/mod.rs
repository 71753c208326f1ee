//! Domain layer types and invariants.

pub mod entities;
pub mod error;
pub mod pricing;
pub mod types;
