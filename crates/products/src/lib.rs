//! Products domain module.
//!
//! The product record, its write payload, and the declarative schema that
//! validates untyped JSON input before it reaches a store. No IO here.

pub mod product;
pub mod schema;

pub use product::{Product, ProductFields, product_schema};
pub use schema::{Rule, Schema};
