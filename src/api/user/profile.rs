use axum::{
    extract::Extension,
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set, TransactionTrait,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use super::customer_profile;
use crate::api::{
    cart_error_response, db_error_response, error_response, validation_response, PHONE_REGEX,
};
use crate::cart::{CartService, Identity};
use crate::entities::{customer, user, wishlist};
use crate::middleware::auth::Claims;
use crate::middleware::logging::{to_response, ApiError};

pub fn profile_router() -> Router {
    Router::new()
        .route("/profile", get(get_profile).patch(patch_profile))
        .route("/dashboard", get(get_dashboard))
}

async fn get_profile(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> Response {
    let customer = match customer_profile(&db, &claims).await {
        Ok(customer) => customer,
        Err(response) => return response,
    };

    match user::Entity::find_by_id(claims.user_id).one(&*db).await {
        Ok(Some(user)) => to_response(
            (StatusCode::OK, Json(profile_body(&user, &customer))),
            Ok(()),
        ),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "User not found"),
        Err(err) => db_error_response(err),
    }
}

async fn patch_profile(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<PatchProfile>,
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

    let user = match user::Entity::find_by_id(claims.user_id).one(&txn).await {
        Ok(Some(user)) => user,
        Ok(None) => return error_response(StatusCode::NOT_FOUND, "User not found"),
        Err(err) => return db_error_response(err),
    };

    let user = match payload.full_name {
        Some(full_name) => {
            let mut user: user::ActiveModel = user.into();
            user.full_name = Set(full_name.trim().to_owned());
            match user.update(&txn).await {
                Ok(user) => user,
                Err(err) => return db_error_response(err),
            }
        }
        None => user,
    };

    let mut active: customer::ActiveModel = customer.into();
    if let Some(phone) = payload.phone {
        active.phone = Set(phone);
    }
    if let Some(address) = payload.address {
        active.address = Set(address);
    }
    active.updated_at = Set(Utc::now());
    let customer = match active.update(&txn).await {
        Ok(customer) => customer,
        Err(err) => return db_error_response(err),
    };

    if let Err(err) = txn.commit().await {
        return db_error_response(err);
    }

    to_response(
        (StatusCode::OK, Json(profile_body(&user, &customer))),
        Ok(()),
    )
}

async fn get_dashboard(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(cart): Extension<Arc<CartService>>,
    Extension(claims): Extension<Claims>,
    Extension(identity): Extension<Identity>,
) -> Response {
    let customer = match customer_profile(&db, &claims).await {
        Ok(customer) => customer,
        Err(response) => return response,
    };

    let orders = match cart.orders(&identity).await {
        Ok(orders) => orders,
        Err(err) => return cart_error_response(err),
    };

    let wishlist_count = match wishlist::Entity::find()
        .filter(wishlist::Column::CustomerId.eq(customer.id))
        .count(&*db)
        .await
    {
        Ok(count) => count,
        Err(err) => return db_error_response(err),
    };

    to_response(
        (
            StatusCode::OK,
            Json(json!({
                "orders": orders,
                "wishlist_count": wishlist_count,
            })),
        ),
        Ok(()),
    )
}

fn profile_body(user: &user::Model, customer: &customer::Model) -> serde_json::Value {
    json!({
        "user_id": user.id,
        "email": user.username,
        "full_name": user.full_name,
        "role": user.role,
        "phone": customer.phone,
        "address": customer.address,
        "joined_date": customer.joined_date,
    })
}

#[derive(Deserialize, Validate)]
struct PatchProfile {
    #[validate(length(min = 1, max = 100))]
    full_name: Option<String>,
    #[validate(regex(path = *PHONE_REGEX))]
    phone: Option<String>,
    #[validate(length(max = 500))]
    address: Option<String>,
}
