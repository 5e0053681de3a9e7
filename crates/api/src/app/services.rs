use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use serde_json::Value;

use stockroom_core::{ProductId, ProductResult};
use stockroom_infra::{
    cache::{self, Cache, InMemoryCache, PRODUCTS_KEY, PRODUCTS_TTL},
    config::{AppConfig, CacheBackend, StoreBackend},
    store::{InMemoryProductStore, PostgresProductStore, ProductStore},
};
use stockroom_products::{Product, ProductFields};

/// Everything the product handlers need, shared across requests.
#[derive(Clone)]
pub struct AppServices {
    store: Arc<dyn ProductStore>,
    cache: Arc<dyn Cache>,
    products_cache_ttl: Duration,
}

impl AppServices {
    pub fn new(store: Arc<dyn ProductStore>, cache: Arc<dyn Cache>, products_cache_ttl: Duration) -> Self {
        Self {
            store,
            cache,
            products_cache_ttl,
        }
    }

    /// In-memory store and cache with the default listing TTL (dev/test).
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryProductStore::new()),
            Arc::new(InMemoryCache::new()),
            PRODUCTS_TTL,
        )
    }

    /// Full listing, read through the cache.
    ///
    /// Writes do not invalidate the cached listing; it goes stale until the
    /// TTL lapses.
    pub async fn list_products(&self) -> ProductResult<Vec<Product>> {
        cache::remember(self.cache.as_ref(), PRODUCTS_KEY, self.products_cache_ttl, || {
            self.store.list()
        })
        .await
    }

    pub async fn create_product(&self, payload: &Value) -> ProductResult<Product> {
        let fields = ProductFields::from_payload(payload)?;
        let product = self.store.create(fields).await?;
        tracing::info!(product_id = %product.id, "product created");
        Ok(product)
    }

    pub async fn get_product(&self, id: ProductId) -> ProductResult<Product> {
        self.store.get(id).await
    }

    /// Existence is checked before the payload is validated.
    pub async fn update_product(&self, id: ProductId, payload: &Value) -> ProductResult<Product> {
        self.store.get(id).await?;
        let fields = ProductFields::from_payload(payload)?;
        let product = self.store.update(id, fields).await?;
        tracing::info!(product_id = %id, "product updated");
        Ok(product)
    }

    pub async fn delete_product(&self, id: ProductId) -> ProductResult<()> {
        self.store.delete(id).await?;
        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }
}

pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let store: Arc<dyn ProductStore> = match &config.store {
        StoreBackend::InMemory => {
            tracing::info!("using in-memory product store");
            Arc::new(InMemoryProductStore::new())
        }
        StoreBackend::Postgres {
            database_url,
            max_connections,
        } => {
            let store = PostgresProductStore::connect(database_url, *max_connections)
                .await
                .context("failed to connect to Postgres")?;
            Arc::new(store)
        }
    };

    let cache = build_cache(&config.cache)?;

    Ok(AppServices::new(store, cache, config.products_cache_ttl))
}

#[cfg(feature = "redis")]
fn build_cache(backend: &CacheBackend) -> anyhow::Result<Arc<dyn Cache>> {
    match backend {
        CacheBackend::InMemory => Ok(Arc::new(InMemoryCache::new())),
        CacheBackend::Redis { url } => {
            let cache = cache::RedisCache::new(url, "stockroom:").context("failed to create Redis cache")?;
            tracing::info!("using redis cache");
            Ok(Arc::new(cache))
        }
    }
}

#[cfg(not(feature = "redis"))]
fn build_cache(backend: &CacheBackend) -> anyhow::Result<Arc<dyn Cache>> {
    if let CacheBackend::Redis { .. } = backend {
        tracing::warn!("CACHE_DRIVER=redis but redis feature not enabled, falling back to in-memory");
    }
    Ok(Arc::new(InMemoryCache::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stockroom_core::ProductError;

    #[tokio::test]
    async fn update_checks_existence_before_validating() {
        let services = AppServices::in_memory();
        let err = services
            .update_product(ProductId::new(1), &json!({ "price": "nope" }))
            .await
            .unwrap_err();
        assert_eq!(err, ProductError::NotFound);
    }

    #[tokio::test]
    async fn invalid_payload_never_reaches_the_store() {
        let services = AppServices::in_memory();
        let err = services.create_product(&json!({ "stock": 1 })).await.unwrap_err();
        assert!(matches!(err, ProductError::Validation(_)));
        assert!(services.store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn listing_stays_stale_after_writes() {
        let services = AppServices::in_memory();
        assert!(services.list_products().await.unwrap().is_empty());

        services
            .create_product(&json!({ "name": "Tablet", "price": 300, "stock": 5 }))
            .await
            .unwrap();

        assert!(services.list_products().await.unwrap().is_empty());
        assert_eq!(services.store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn default_config_builds_in_memory_services() {
        let services = build_services(&AppConfig::default()).await.unwrap();
        assert_eq!(services.products_cache_ttl, PRODUCTS_TTL);
    }
}
