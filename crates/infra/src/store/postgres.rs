//! Postgres-backed product store.
//!
//! Every operation is a single statement against the `products` table, so no
//! explicit transactions are needed. Column types:
//! `id BIGSERIAL`, `name VARCHAR(255)`, `description TEXT NULL`,
//! `price NUMERIC`, `stock BIGINT`, timestamps as `TIMESTAMPTZ`.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::instrument;

use stockroom_core::{ProductError, ProductId, ProductResult};
use stockroom_products::{Product, ProductFields};

use super::ProductStore;

const COLUMNS: &str = "id, name, description, price, stock, created_at, updated_at";

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS products (
        id          BIGSERIAL PRIMARY KEY,
        name        VARCHAR(255) NOT NULL,
        description TEXT NULL,
        price       NUMERIC NOT NULL,
        stock       BIGINT NOT NULL,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
"#;

/// Postgres product store over a shared sqlx pool.
#[derive(Debug, Clone)]
pub struct PostgresProductStore {
    pool: PgPool,
}

impl PostgresProductStore {
    /// Wrap an existing pool. The `products` table must already exist.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to `database_url` and make sure the `products` table exists.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        sqlx::query(CREATE_TABLE).execute(&pool).await?;
        tracing::info!("postgres product store ready");

        Ok(Self::new(pool))
    }
}

fn row_to_product(row: &PgRow) -> Result<Product, sqlx::Error> {
    Ok(Product {
        id: ProductId::new(row.try_get("id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        price: row.try_get("price")?,
        stock: row.try_get("stock")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn db_error(err: sqlx::Error) -> ProductError {
    ProductError::unexpected(err.to_string())
}

#[async_trait]
impl ProductStore for PostgresProductStore {
    #[instrument(skip(self, fields), fields(operation = "insert_product"))]
    async fn create(&self, fields: ProductFields) -> ProductResult<Product> {
        let sql = format!(
            "INSERT INTO products (name, description, price, stock, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, NOW(), NOW()) \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(&fields.name)
            .bind(&fields.description)
            .bind(fields.price)
            .bind(fields.stock)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;

        row_to_product(&row).map_err(db_error)
    }

    #[instrument(skip(self), fields(operation = "get_product"))]
    async fn get(&self, id: ProductId) -> ProductResult<Product> {
        let sql = format!("SELECT {COLUMNS} FROM products WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .ok_or(ProductError::NotFound)?;

        row_to_product(&row).map_err(db_error)
    }

    #[instrument(skip(self), fields(operation = "list_products"))]
    async fn list(&self) -> ProductResult<Vec<Product>> {
        let sql = format!("SELECT {COLUMNS} FROM products ORDER BY id ASC");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        rows.iter()
            .map(|row| row_to_product(row).map_err(db_error))
            .collect()
    }

    #[instrument(skip(self, fields), fields(operation = "update_product"))]
    async fn update(&self, id: ProductId, fields: ProductFields) -> ProductResult<Product> {
        let sql = format!(
            "UPDATE products \
             SET name = $2, description = $3, price = $4, stock = $5, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(id.get())
            .bind(&fields.name)
            .bind(&fields.description)
            .bind(fields.price)
            .bind(fields.stock)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .ok_or(ProductError::NotFound)?;

        row_to_product(&row).map_err(db_error)
    }

    #[instrument(skip(self), fields(operation = "delete_product"))]
    async fn delete(&self, id: ProductId) -> ProductResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(ProductError::NotFound);
        }
        Ok(())
    }
}
