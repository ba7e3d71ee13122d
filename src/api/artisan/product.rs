use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Response,
    routing::{get, patch, post},
    Json, Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, Set, TransactionTrait};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use validator::{Validate, ValidationError};

use super::artisan_profile;
use crate::api::public::product::ProductResponse;
use crate::api::{db_error_response, error_response, validation_response};
use crate::entities::{category, product, slug::unique_product_slug};
use crate::middleware::auth::Claims;
use crate::middleware::logging::{to_response, ApiError};
use crate::pricing::DiscountSummary;

pub fn artisan_product_router() -> Router {
    Router::new()
        .route("/products", post(create_product))
        .route("/products/:id", patch(patch_product))
        .route("/products/discount-preview", get(discount_preview))
}

/// Savings shown on the product form while the artisan is still typing.
async fn discount_preview(Query(params): Query<DiscountPreviewQuery>) -> Response {
    let summary = DiscountSummary::parse(
        params.price.as_deref().unwrap_or_default(),
        params.discount_price.as_deref(),
    );
    to_response((StatusCode::OK, Json(summary)), Ok(()))
}

async fn create_product(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateProduct>,
) -> Response {
    if let Err(errors) = payload.validate() {
        return validation_response(errors);
    }

    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(_) => return transaction_failed(),
    };

    let artisan = match artisan_profile(&txn, &claims).await {
        Ok(artisan) => artisan,
        Err(response) => return response,
    };

    if let Some(category_id) = payload.category_id {
        if let Err(response) = ensure_category(&txn, category_id).await {
            return response;
        }
    }

    let slug = match unique_product_slug(&txn, &payload.name, None).await {
        Ok(slug) => slug,
        Err(err) => return db_error_response(err),
    };

    let new_product = product::ActiveModel {
        artisan_id: Set(artisan.id),
        category_id: Set(payload.category_id),
        name: Set(payload.name.trim().to_owned()),
        description: Set(payload.description.unwrap_or_default()),
        price: Set(payload.price),
        discount_price: Set(payload.discount_price),
        stock: Set(payload.stock.unwrap_or(1)),
        is_featured: Set(payload.is_featured.unwrap_or_default()),
        is_new: Set(payload.is_new.unwrap_or(true)),
        is_on_sale: Set(payload.discount_price.is_some()),
        rating: Set(0.0),
        rating_count: Set(0),
        slug: Set(slug),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    let created = match new_product.insert(&txn).await {
        Ok(created) => created,
        Err(err) => return db_error_response(err),
    };
    if let Err(err) = txn.commit().await {
        return db_error_response(err);
    }

    info!(product_id = created.id, artisan_id = artisan.id, "Product created");
    to_response(
        (StatusCode::CREATED, Json(ProductResponse::new(created))),
        Ok(()),
    )
}

async fn patch_product(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<PatchProduct>,
) -> Response {
    if let Err(errors) = payload.validate() {
        return validation_response(errors);
    }

    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(_) => return transaction_failed(),
    };

    let artisan = match artisan_profile(&txn, &claims).await {
        Ok(artisan) => artisan,
        Err(response) => return response,
    };

    let existing = match product::Entity::find_by_id(id).one(&txn).await {
        Ok(Some(existing)) => existing,
        Ok(None) => {
            return error_response(
                StatusCode::NOT_FOUND,
                format!("No product with {} id was found.", id),
            )
        }
        Err(err) => return db_error_response(err),
    };

    if existing.artisan_id != artisan.id {
        return error_response(
            StatusCode::FORBIDDEN,
            format!("Product {} belongs to another artisan.", id),
        );
    }

    let price = payload.price.unwrap_or(existing.price);
    let discount_price = if payload.clear_discount.unwrap_or_default() {
        None
    } else {
        payload.discount_price.or(existing.discount_price)
    };
    if let Some(discount) = discount_price {
        if discount >= price {
            return error_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                "Discount price must be below the regular price",
            );
        }
    }

    let mut product: product::ActiveModel = existing.into();

    if let Some(name) = payload.name {
        let slug = match unique_product_slug(&txn, &name, Some(id)).await {
            Ok(slug) => slug,
            Err(err) => return db_error_response(err),
        };
        product.name = Set(name.trim().to_owned());
        product.slug = Set(slug);
    }

    if let Some(description) = payload.description {
        product.description = Set(description);
    }

    if let Some(category_id) = payload.category_id {
        if let Err(response) = ensure_category(&txn, category_id).await {
            return response;
        }
        product.category_id = Set(Some(category_id));
    }

    if let Some(stock) = payload.stock {
        product.stock = Set(stock);
    }

    if let Some(is_featured) = payload.is_featured {
        product.is_featured = Set(is_featured);
    }

    if let Some(is_new) = payload.is_new {
        product.is_new = Set(is_new);
    }

    product.price = Set(price);
    product.discount_price = Set(discount_price);
    product.is_on_sale = Set(discount_price.is_some());

    let updated = match product.update(&txn).await {
        Ok(updated) => updated,
        Err(err) => return db_error_response(err),
    };
    if let Err(err) = txn.commit().await {
        return db_error_response(err);
    }

    to_response(
        (StatusCode::OK, Json(ProductResponse::new(updated))),
        Ok(()),
    )
}

async fn ensure_category<C: ConnectionTrait>(db: &C, category_id: i32) -> Result<(), Response> {
    match category::Entity::find_by_id(category_id).one(db).await {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err(error_response(
            StatusCode::NOT_FOUND,
            format!("No category with {} id was found.", category_id),
        )),
        Err(err) => Err(db_error_response(err)),
    }
}

fn transaction_failed() -> Response {
    to_response(
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Internal server error" })),
        ),
        Err(ApiError::TransactionCreationFailed),
    )
}

#[derive(Deserialize)]
struct DiscountPreviewQuery {
    price: Option<String>,
    discount_price: Option<String>,
}

#[derive(Deserialize, Validate)]
#[validate(schema(function = "validate_prices"))]
struct CreateProduct {
    #[validate(length(min = 1, max = 200))]
    name: String,
    description: Option<String>,
    price: Decimal,
    discount_price: Option<Decimal>,
    category_id: Option<i32>,
    #[validate(range(min = 0))]
    stock: Option<i32>,
    is_featured: Option<bool>,
    is_new: Option<bool>,
}

fn validate_prices(payload: &CreateProduct) -> Result<(), ValidationError> {
    if payload.price <= Decimal::ZERO {
        return Err(ValidationError::new("price_must_be_positive"));
    }
    match payload.discount_price {
        Some(discount) if discount <= Decimal::ZERO || discount >= payload.price => {
            Err(ValidationError::new("discount_must_be_below_price"))
        }
        _ => Ok(()),
    }
}

#[derive(Deserialize, Validate)]
#[validate(schema(function = "validate_patch_prices"))]
struct PatchProduct {
    #[validate(length(min = 1, max = 200))]
    name: Option<String>,
    description: Option<String>,
    price: Option<Decimal>,
    discount_price: Option<Decimal>,
    clear_discount: Option<bool>,
    category_id: Option<i32>,
    #[validate(range(min = 0))]
    stock: Option<i32>,
    is_featured: Option<bool>,
    is_new: Option<bool>,
}

fn validate_patch_prices(payload: &PatchProduct) -> Result<(), ValidationError> {
    let non_positive = |value: Option<Decimal>| value.is_some_and(|v| v <= Decimal::ZERO);
    if non_positive(payload.price) || non_positive(payload.discount_price) {
        Err(ValidationError::new("price_must_be_positive"))
    } else {
        Ok(())
    }
}
