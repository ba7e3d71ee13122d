use axum::{extract::Extension, http::StatusCode, response::Response, routing::post, Json, Router};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use super::artisan_profile;
use crate::api::public::story::StoryResponse;
use crate::api::{db_error_response, validation_response};
use crate::entities::story;
use crate::middleware::auth::Claims;
use crate::middleware::logging::to_response;

pub fn artisan_story_router() -> Router {
    Router::new().route("/stories", post(create_story))
}

async fn create_story(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateStory>,
) -> Response {
    if let Err(errors) = payload.validate() {
        return validation_response(errors);
    }

    let artisan = match artisan_profile(&*db, &claims).await {
        Ok(artisan) => artisan,
        Err(response) => return response,
    };

    let tags = payload
        .tags
        .unwrap_or_default()
        .iter()
        .map(|tag| tag.trim())
        .filter(|tag| !tag.is_empty())
        .collect::<Vec<_>>()
        .join(",");

    let new_story = story::ActiveModel {
        artisan_id: Set(artisan.id),
        title: Set(payload.title.trim().to_owned()),
        content: Set(payload.content),
        tags: Set(tags),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    match new_story.insert(&*db).await {
        Ok(created) => to_response(
            (StatusCode::CREATED, Json(StoryResponse::new(created))),
            Ok(()),
        ),
        Err(err) => db_error_response(err),
    }
}

#[derive(Deserialize, Validate)]
struct CreateStory {
    #[validate(length(min = 1, max = 200))]
    title: String,
    #[validate(length(min = 1))]
    content: String,
    tags: Option<Vec<String>>,
}
