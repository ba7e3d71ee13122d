use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Response,
    routing::{get, patch},
    Json, Router,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::api::{db_error_response, error_response};
use crate::entities::order::{self, Status};
use crate::middleware::logging::to_response;

pub fn admin_order_router() -> Router {
    Router::new()
        .route("/orders", get(get_orders))
        .route("/orders/:id/status", patch(patch_status))
}

async fn get_orders(
    Query(params): Query<OrdersQuery>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Response {
    let mut finder = order::Entity::find().order_by_desc(order::Column::CreatedAt);
    if let Some(status) = params.status {
        finder = finder.filter(order::Column::Status.eq(status));
    }

    match finder.all(&*db).await {
        Ok(orders) => to_response((StatusCode::OK, Json(json!({ "orders": orders }))), Ok(())),
        Err(err) => db_error_response(err),
    }
}

async fn patch_status(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<PatchStatus>,
) -> Response {
    let existing = match order::Entity::find_by_id(id).one(&*db).await {
        Ok(Some(existing)) => existing,
        Ok(None) => {
            return error_response(
                StatusCode::NOT_FOUND,
                format!("No order with {} id was found.", id),
            )
        }
        Err(err) => return db_error_response(err),
    };

    let current = existing.status;
    if !current.admin_can_transition_to(payload.status) {
        return error_response(
            StatusCode::CONFLICT,
            format!("Cannot move order {} from {} to {}.", id, current, payload.status),
        );
    }

    let mut active: order::ActiveModel = existing.into();
    active.status = Set(payload.status);
    active.updated_at = Set(Utc::now());

    // no-op if the status moved since it was read
    let result = order::Entity::update_many()
        .set(active)
        .filter(order::Column::Id.eq(id))
        .filter(order::Column::Status.eq(current))
        .exec(&*db)
        .await;

    match result {
        Ok(result) if result.rows_affected == 1 => {
            info!(order_id = id, from = %current, to = %payload.status, "Order status changed");
            match order::Entity::find_by_id(id).one(&*db).await {
                Ok(Some(updated)) => to_response((StatusCode::OK, Json(updated)), Ok(())),
                Ok(None) => error_response(
                    StatusCode::NOT_FOUND,
                    format!("No order with {} id was found.", id),
                ),
                Err(err) => db_error_response(err),
            }
        }
        Ok(_) => error_response(
            StatusCode::CONFLICT,
            format!("Order {} changed while updating, retry.", id),
        ),
        Err(err) => db_error_response(err),
    }
}

#[derive(Deserialize)]
struct OrdersQuery {
    status: Option<Status>,
}

#[derive(Deserialize)]
struct PatchStatus {
    status: Status,
}
