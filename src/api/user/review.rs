use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::post,
    Json, Router,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set, TransactionTrait};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use super::customer_profile;
use crate::api::{db_error_response, error_response, validation_response};
use crate::entities::{product, review};
use crate::middleware::auth::Claims;
use crate::middleware::logging::{to_response, ApiError};

pub fn review_router() -> Router {
    Router::new().route("/products/:id/reviews", post(create_review))
}

async fn create_review(
    Path(product_id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ReviewPayload>,
) -> Response {
    if let Err(errors) = payload.validate() {
        return validation_response(errors);
    }

    let customer = match customer_profile(&db, &claims).await {
        Ok(customer) => customer,
        Err(response) => return response,
    };

    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(_) => {
            return to_response(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                ),
                Err(ApiError::TransactionCreationFailed),
            )
        }
    };

    let product = match product::Entity::find_by_id(product_id).one(&txn).await {
        Ok(Some(product)) => product,
        Ok(None) => {
            return error_response(
                StatusCode::NOT_FOUND,
                format!("No product with {} id was found.", product_id),
            )
        }
        Err(err) => return db_error_response(err),
    };

    let review = review::ActiveModel {
        product_id: Set(product.id),
        customer_id: Set(customer.id),
        rating: Set(payload.rating),
        comment: Set(payload.comment.unwrap_or_default()),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    let review = match review.insert(&txn).await {
        Ok(review) => review,
        Err(err) => return db_error_response(err),
    };

    let (rating, rating_count) = product.rating_with(payload.rating);
    let mut product: product::ActiveModel = product.into();
    product.rating = Set(rating);
    product.rating_count = Set(rating_count);
    if let Err(err) = product.update(&txn).await {
        return db_error_response(err);
    }
    if let Err(err) = txn.commit().await {
        return db_error_response(err);
    }

    info!(product_id, rating = payload.rating, "Review added");
    to_response(
        (
            StatusCode::CREATED,
            Json(json!({
                "review": review,
                "rating": rating,
                "rating_count": rating_count,
            })),
        ),
        Ok(()),
    )
}

#[derive(Deserialize, Validate)]
struct ReviewPayload {
    #[validate(range(min = 1, max = 5))]
    rating: i32,
    #[validate(length(max = 2000))]
    comment: Option<String>,
}
