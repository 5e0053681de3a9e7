use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use stockroom_core::{ProductError, ProductId};

use crate::app::dto;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route(
            "/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}

/// Path ids that cannot name a product are reported the same way as ids that
/// do not exist.
fn parse_id(raw: &str, action: &'static str) -> Result<ProductId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::new(action, ProductError::NotFound))
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Response, ApiError> {
    const ACTION: &str = "Failed to retrieve products";

    let products = services
        .list_products()
        .await
        .map_err(ApiError::during(ACTION))?;
    Ok((StatusCode::OK, Json(products)).into_response())
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    const ACTION: &str = "Failed to create product";

    let payload = dto::parse_payload(&body);
    let product = services
        .create_product(&payload)
        .await
        .map_err(ApiError::during(ACTION))?;
    Ok((StatusCode::CREATED, Json(product)).into_response())
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    const ACTION: &str = "Failed to retrieve product";

    let id = parse_id(&id, ACTION)?;
    let product = services
        .get_product(id)
        .await
        .map_err(ApiError::during(ACTION))?;
    Ok((StatusCode::OK, Json(product)).into_response())
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Response, ApiError> {
    const ACTION: &str = "Failed to update product";

    let id = parse_id(&id, ACTION)?;
    let payload = dto::parse_payload(&body);
    let product = services
        .update_product(id, &payload)
        .await
        .map_err(ApiError::during(ACTION))?;
    Ok((StatusCode::OK, Json(product)).into_response())
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    const ACTION: &str = "Failed to delete product";

    let id = parse_id(&id, ACTION)?;
    services
        .delete_product(id)
        .await
        .map_err(ApiError::during(ACTION))?;
    Ok((StatusCode::OK, Json(dto::PRODUCT_DELETED)).into_response())
}
