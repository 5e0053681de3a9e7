//! Infrastructure layer: product storage, caching, configuration.

pub mod cache;
pub mod config;
pub mod store;
