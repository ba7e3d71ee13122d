use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};
use sea_orm::{DatabaseConnection, EntityTrait, ModelTrait, QueryOrder};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use crate::api::public::product::ProductResponse;
use crate::api::{db_error_response, error_response};
use crate::entities::{category, category::Entity as CategoryEntity, product};
use crate::middleware::logging::to_response;

pub fn category_router() -> Router {
    Router::new()
        .route("/categories", get(get_categories))
        .route("/categories/:id", get(get_category))
}

async fn get_categories(Extension(db): Extension<Arc<DatabaseConnection>>) -> Response {
    match CategoryEntity::find()
        .order_by_asc(category::Column::Name)
        .all(&*db)
        .await
    {
        Ok(categories) => {
            let response: Vec<CategoryResponse> =
                categories.into_iter().map(CategoryResponse::new).collect();
            to_response((StatusCode::OK, Json(response)), Ok(()))
        }
        Err(err) => db_error_response(err),
    }
}

async fn get_category(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Response {
    let category = match CategoryEntity::find_by_id(id).one(&*db).await {
        Ok(Some(category)) => category,
        Ok(None) => {
            return error_response(
                StatusCode::NOT_FOUND,
                format!("No category with {} id was found.", id),
            )
        }
        Err(err) => return db_error_response(err),
    };

    match category
        .find_related(product::Entity)
        .order_by_desc(product::Column::CreatedAt)
        .all(&*db)
        .await
    {
        Ok(products) => {
            let products: Vec<ProductResponse> =
                products.into_iter().map(ProductResponse::new).collect();
            to_response(
                (
                    StatusCode::OK,
                    Json(json!({
                        "category": CategoryResponse::new(category),
                        "products": products,
                    })),
                ),
                Ok(()),
            )
        }
        Err(err) => db_error_response(err),
    }
}

#[derive(Serialize)]
pub(crate) struct CategoryResponse {
    id: i32,
    name: String,
    slug: String,
    description: String,
}

impl CategoryResponse {
    pub(crate) fn new(value: category::Model) -> CategoryResponse {
        CategoryResponse {
            id: value.id,
            name: value.name,
            slug: value.slug,
            description: value.description,
        }
    }
}
