//! Error model shared by the store, the validation schema and the HTTP layer.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

/// Result type used across the product layers.
pub type ProductResult<T> = Result<T, ProductError>;

/// Product-level error.
///
/// Every failure a handler can observe falls into one of these three kinds.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProductError {
    /// The requested product id does not exist.
    #[error("product not found")]
    NotFound,

    /// A write payload violated the validation schema.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// Anything else (backend unreachable, decode failure, poisoned lock...).
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl ProductError {
    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self::Unexpected(msg.into())
    }
}

impl From<ValidationErrors> for ProductError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value)
    }
}

/// Field name -> human readable messages, ordered by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// `Ok(())` when nothing was recorded, otherwise the collected errors.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl core::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_accumulate_per_field() {
        let mut errors = ValidationErrors::new();
        errors.add("price", "The price field must be a number.");
        errors.add("name", "The name field is required.");
        errors.add("price", "second");

        assert_eq!(errors.get("price").unwrap().len(), 2);
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["name", "price"]);
    }

    #[test]
    fn serializes_as_plain_map() {
        let mut errors = ValidationErrors::new();
        errors.add("name", "The name field is required.");

        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json, serde_json::json!({ "name": ["The name field is required."] }));
    }

    #[test]
    fn empty_collection_is_ok() {
        assert!(ValidationErrors::new().into_result().is_ok());
    }
}
