//! `stockroom-core` — shared building blocks for the product service.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;

pub use error::{ProductError, ProductResult, ValidationErrors};
pub use id::{InvalidProductId, ProductId};
