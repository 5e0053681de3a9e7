use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use stockroom_core::{ProductError, ProductId, ProductResult};
use stockroom_products::{Product, ProductFields};

use super::ProductStore;

/// In-memory product store for tests/dev.
///
/// Ids start at 1 and are never reused, even after a delete.
#[derive(Debug)]
pub struct InMemoryProductStore {
    inner: RwLock<State>,
}

#[derive(Debug)]
struct State {
    last_id: i64,
    rows: BTreeMap<ProductId, Product>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(State {
                last_id: 0,
                rows: BTreeMap::new(),
            }),
        }
    }
}

impl Default for InMemoryProductStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> ProductError {
    ProductError::unexpected("product store lock poisoned")
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn create(&self, fields: ProductFields) -> ProductResult<Product> {
        let mut state = self.inner.write().map_err(poisoned)?;
        state.last_id += 1;
        let id = ProductId::new(state.last_id);

        let product = Product::new(id, fields, Utc::now());
        state.rows.insert(id, product.clone());
        Ok(product)
    }

    async fn get(&self, id: ProductId) -> ProductResult<Product> {
        let state = self.inner.read().map_err(poisoned)?;
        state.rows.get(&id).cloned().ok_or(ProductError::NotFound)
    }

    async fn list(&self) -> ProductResult<Vec<Product>> {
        let state = self.inner.read().map_err(poisoned)?;
        Ok(state.rows.values().cloned().collect())
    }

    async fn update(&self, id: ProductId, fields: ProductFields) -> ProductResult<Product> {
        let mut state = self.inner.write().map_err(poisoned)?;
        let product = state.rows.get_mut(&id).ok_or(ProductError::NotFound)?;
        product.replace(fields, Utc::now());
        Ok(product.clone())
    }

    async fn delete(&self, id: ProductId) -> ProductResult<()> {
        let mut state = self.inner.write().map_err(poisoned)?;
        state.rows.remove(&id).map(|_| ()).ok_or(ProductError::NotFound)
    }
}
