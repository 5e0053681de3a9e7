use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use stockroom_core::{ProductId, ValidationErrors};

use crate::schema::{Rule, Schema, as_decimal, as_integer};

/// Maximum number of characters in a product name.
pub const NAME_MAX_CHARS: usize = 255;

/// A stored product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub price: Decimal,
    pub stock: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Build a freshly created record; both timestamps are `now`.
    pub fn new(id: ProductId, fields: ProductFields, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: fields.name,
            description: fields.description,
            price: fields.price,
            stock: fields.stock,
            created_at: now,
            updated_at: now,
        }
    }

    /// Full replace of the writable fields. `created_at` is left untouched.
    pub fn replace(&mut self, fields: ProductFields, now: DateTime<Utc>) {
        self.name = fields.name;
        self.description = fields.description;
        self.price = fields.price;
        self.stock = fields.stock;
        self.updated_at = now;
    }
}

/// Writable product fields, as accepted by create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFields {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i64,
}

/// Rules applied to create and update payloads.
pub fn product_schema() -> Schema {
    Schema::new()
        .field("name", [Rule::Required, Rule::String, Rule::Max(NAME_MAX_CHARS)])
        .field("description", [Rule::Nullable, Rule::String])
        .field("price", [Rule::Required, Rule::Numeric])
        .field("stock", [Rule::Required, Rule::Integer])
}

impl ProductFields {
    /// Validate an untyped payload against [`product_schema`].
    pub fn from_payload(payload: &Value) -> Result<Self, ValidationErrors> {
        Self::validate(payload, &product_schema())
    }

    /// Validate against `schema` and extract typed fields.
    ///
    /// A schema that lets a mandatory product field through unchecked still
    /// fails here with a "required" message for that field.
    pub fn validate(payload: &Value, schema: &Schema) -> Result<Self, ValidationErrors> {
        let data = schema.validate(payload)?;

        let name = data.get("name").and_then(Value::as_str).map(str::to_owned);
        let description = data
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_owned);
        let price = data.get("price").and_then(as_decimal);
        let stock = data.get("stock").and_then(as_integer);

        match (name, price, stock) {
            (Some(name), Some(price), Some(stock)) => Ok(Self {
                name,
                description,
                price,
                stock,
            }),
            (name, price, stock) => {
                let mut errors = ValidationErrors::new();
                for (field, missing) in [
                    ("name", name.is_none()),
                    ("price", price.is_none()),
                    ("stock", stock.is_none()),
                ] {
                    if missing {
                        errors.add(field, format!("The {field} field is required."));
                    }
                }
                Err(errors)
            }
        }
    }
}
