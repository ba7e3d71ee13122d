use axum::{extract::Extension, http::StatusCode, response::Response, routing::post, Json, Router};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::api::public::category::CategoryResponse;
use crate::api::{db_error_response, error_response, validation_response};
use crate::entities::{category, slug::unique_category_slug};
use crate::middleware::logging::to_response;

pub fn admin_category_router() -> Router {
    Router::new().route("/categories", post(create_category))
}

async fn create_category(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<CreateCategory>,
) -> Response {
    if let Err(errors) = payload.validate() {
        return validation_response(errors);
    }

    let name = payload.name.trim().to_owned();
    match category::Entity::find()
        .filter(category::Column::Name.eq(&*name))
        .count(&*db)
        .await
    {
        Ok(0) => {}
        Ok(_) => return error_response(StatusCode::CONFLICT, "Category already exists"),
        Err(err) => return db_error_response(err),
    }

    let slug = match unique_category_slug(&*db, &name).await {
        Ok(slug) => slug,
        Err(err) => return db_error_response(err),
    };

    let new_category = category::ActiveModel {
        name: Set(name),
        description: Set(payload.description.unwrap_or_default()),
        slug: Set(slug),
        ..Default::default()
    };

    match new_category.insert(&*db).await {
        Ok(created) => to_response(
            (StatusCode::CREATED, Json(CategoryResponse::new(created))),
            Ok(()),
        ),
        Err(err) => db_error_response(err),
    }
}

#[derive(Deserialize, Validate)]
struct CreateCategory {
    #[validate(length(min = 1, max = 100))]
    name: String,
    description: Option<String>,
}
