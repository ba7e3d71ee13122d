use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde_json::json;
use std::sync::Arc;

use super::customer_profile;
use crate::api::public::product::ProductResponse;
use crate::api::{db_error_response, error_response};
use crate::entities::{product, wishlist};
use crate::middleware::auth::Claims;
use crate::middleware::logging::to_response;

pub fn wishlist_router() -> Router {
    Router::new()
        .route("/wishlist", get(get_wishlist))
        .route(
            "/wishlist/:product_id",
            post(add_to_wishlist).delete(remove_from_wishlist),
        )
}

async fn get_wishlist(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> Response {
    let customer = match customer_profile(&db, &claims).await {
        Ok(customer) => customer,
        Err(response) => return response,
    };

    match wishlist::Entity::find()
        .filter(wishlist::Column::CustomerId.eq(customer.id))
        .order_by_desc(wishlist::Column::AddedAt)
        .find_also_related(product::Entity)
        .all(&*db)
        .await
    {
        Ok(rows) => {
            let items: Vec<_> = rows
                .into_iter()
                .filter_map(|(entry, product)| {
                    product.map(|product| {
                        json!({
                            "added_at": entry.added_at,
                            "product": ProductResponse::new(product),
                        })
                    })
                })
                .collect();
            to_response((StatusCode::OK, Json(json!({ "items": items }))), Ok(()))
        }
        Err(err) => db_error_response(err),
    }
}

async fn add_to_wishlist(
    Path(product_id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> Response {
    let customer = match customer_profile(&db, &claims).await {
        Ok(customer) => customer,
        Err(response) => return response,
    };

    match product::Entity::find_by_id(product_id).one(&*db).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return error_response(
                StatusCode::NOT_FOUND,
                format!("No product with {} id was found.", product_id),
            )
        }
        Err(err) => return db_error_response(err),
    }

    let existing = wishlist::Entity::find()
        .filter(wishlist::Column::CustomerId.eq(customer.id))
        .filter(wishlist::Column::ProductId.eq(product_id))
        .count(&*db)
        .await;
    match existing {
        Ok(0) => {}
        Ok(_) => {
            return to_response(
                (
                    StatusCode::OK,
                    Json(json!({ "message": "Already in wishlist" })),
                ),
                Ok(()),
            )
        }
        Err(err) => return db_error_response(err),
    }

    let entry = wishlist::ActiveModel {
        customer_id: Set(customer.id),
        product_id: Set(product_id),
        added_at: Set(Utc::now()),
        ..Default::default()
    };
    match entry.insert(&*db).await {
        Ok(entry) => to_response(
            (
                StatusCode::CREATED,
                Json(json!({
                    "message": "Added to wishlist",
                    "entry": entry,
                })),
            ),
            Ok(()),
        ),
        Err(err) => db_error_response(err),
    }
}

async fn remove_from_wishlist(
    Path(product_id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> Response {
    let customer = match customer_profile(&db, &claims).await {
        Ok(customer) => customer,
        Err(response) => return response,
    };

    match wishlist::Entity::delete_many()
        .filter(wishlist::Column::CustomerId.eq(customer.id))
        .filter(wishlist::Column::ProductId.eq(product_id))
        .exec(&*db)
        .await
    {
        Ok(result) if result.rows_affected > 0 => to_response(
            (
                StatusCode::OK,
                Json(json!({ "message": "Removed from wishlist" })),
            ),
            Ok(()),
        ),
        Ok(_) => error_response(
            StatusCode::NOT_FOUND,
            format!("Product {} is not in the wishlist.", product_id),
        ),
        Err(err) => db_error_response(err),
    }
}
