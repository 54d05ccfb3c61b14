//! API endpoint handlers module
//!
//! Contains all HTTP endpoint handler implementations.

pub mod cultures;
pub mod health;
pub mod kits;
pub mod metadata;
pub mod scoring;
