use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use stockroom_core::ProductError;

/// A product error on its way out of a handler.
///
/// `action` names the failed operation and becomes the `error` field of a
/// 500 response (e.g. "Failed to create product").
#[derive(Debug)]
pub struct ApiError {
    action: &'static str,
    error: ProductError,
}

impl ApiError {
    pub fn new(action: &'static str, error: ProductError) -> Self {
        Self { action, error }
    }

    /// Adapter for `map_err`.
    pub fn during(action: &'static str) -> impl FnOnce(ProductError) -> Self {
        move |error| Self::new(action, error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.error {
            ProductError::NotFound => {
                (StatusCode::NOT_FOUND, axum::Json(json!({ "error": "Product not found" }))).into_response()
            }
            ProductError::Validation(messages) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                axum::Json(json!({
                    "error": "Validation failed",
                    "messages": messages,
                })),
            )
                .into_response(),
            ProductError::Unexpected(msg) => {
                tracing::error!(action = self.action, error = %msg, "unexpected error");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, self.action, msg)
            }
        }
    }
}

pub fn json_error(status: StatusCode, error: &str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": error,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_core::ValidationErrors;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn not_found_maps_to_404() {
        let response = ApiError::new("Failed to retrieve product", ProductError::NotFound).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await, json!({ "error": "Product not found" }));
    }

    #[tokio::test]
    async fn validation_maps_to_422_with_messages() {
        let mut errors = ValidationErrors::new();
        errors.add("name", "The name field is required.");

        let response = ApiError::new("Failed to create product", errors.into()).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            body_json(response).await,
            json!({
                "error": "Validation failed",
                "messages": { "name": ["The name field is required."] }
            })
        );
    }

    #[tokio::test]
    async fn unexpected_maps_to_500_with_action() {
        let response =
            ApiError::new("Failed to delete product", ProductError::unexpected("pool timed out")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({ "error": "Failed to delete product", "message": "pool timed out" })
        );
    }
}
