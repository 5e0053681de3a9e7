//! Product persistence.
//!
//! One trait, two backends: an in-memory map for dev/tests and a Postgres
//! table for real deployments. Handlers only ever see `Arc<dyn ProductStore>`.

pub mod in_memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;

use stockroom_core::{ProductId, ProductResult};
use stockroom_products::{Product, ProductFields};

pub use in_memory::InMemoryProductStore;
pub use postgres::PostgresProductStore;

/// CRUD primitives over the products table.
///
/// Missing ids surface as `ProductError::NotFound`; any backend failure as
/// `ProductError::Unexpected`.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Insert a new product; the store assigns id and timestamps.
    async fn create(&self, fields: ProductFields) -> ProductResult<Product>;

    async fn get(&self, id: ProductId) -> ProductResult<Product>;

    /// All products, ordered by id.
    async fn list(&self) -> ProductResult<Vec<Product>>;

    /// Replace name/description/price/stock and bump `updated_at`.
    async fn update(&self, id: ProductId, fields: ProductFields) -> ProductResult<Product>;

    async fn delete(&self, id: ProductId) -> ProductResult<()>;
}

#[async_trait]
impl<S> ProductStore for Arc<S>
where
    S: ProductStore + ?Sized,
{
    async fn create(&self, fields: ProductFields) -> ProductResult<Product> {
        (**self).create(fields).await
    }

    async fn get(&self, id: ProductId) -> ProductResult<Product> {
        (**self).get(id).await
    }

    async fn list(&self) -> ProductResult<Vec<Product>> {
        (**self).list().await
    }

    async fn update(&self, id: ProductId, fields: ProductFields) -> ProductResult<Product> {
        (**self).update(id, fields).await
    }

    async fn delete(&self, id: ProductId) -> ProductResult<()> {
        (**self).delete(id).await
    }
}
