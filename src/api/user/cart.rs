use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

use crate::api::cart_error_response;
use crate::cart::{CartService, Identity};
use crate::middleware::logging::to_response;

pub fn cart_router() -> Router {
    Router::new()
        .route("/cart", get(get_cart))
        .route("/cart/add/:product_id", post(add_to_cart))
        .route("/cart/items/:id", delete(remove_from_cart))
        .route("/checkout", post(checkout))
}

async fn get_cart(
    Extension(cart): Extension<Arc<CartService>>,
    Extension(identity): Extension<Identity>,
) -> Response {
    match cart.view_cart(&identity).await {
        Ok(view) => to_response((StatusCode::OK, Json(view)), Ok(())),
        Err(err) => cart_error_response(err),
    }
}

async fn add_to_cart(
    Path(product_id): Path<i32>,
    Extension(cart): Extension<Arc<CartService>>,
    Extension(identity): Extension<Identity>,
) -> Response {
    match cart.add_to_cart(&identity, product_id).await {
        Ok(item) => to_response(
            (
                StatusCode::OK,
                Json(json!({
                    "message": "Product added to cart",
                    "item": item,
                })),
            ),
            Ok(()),
        ),
        Err(err) => cart_error_response(err),
    }
}

async fn remove_from_cart(
    Path(item_id): Path<i32>,
    Extension(cart): Extension<Arc<CartService>>,
    Extension(identity): Extension<Identity>,
) -> Response {
    match cart.remove_from_cart(&identity, item_id).await {
        Ok(()) => to_response(
            (
                StatusCode::OK,
                Json(json!({ "message": "Item removed from cart" })),
            ),
            Ok(()),
        ),
        Err(err) => cart_error_response(err),
    }
}

async fn checkout(
    Extension(cart): Extension<Arc<CartService>>,
    Extension(identity): Extension<Identity>,
) -> Response {
    match cart.checkout(&identity).await {
        Ok(order) => to_response(
            (
                StatusCode::OK,
                Json(json!({
                    "message": "Order placed",
                    "order": order,
                })),
            ),
            Ok(()),
        ),
        Err(err) => cart_error_response(err),
    }
}
