use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder};
use serde::Serialize;
use std::sync::Arc;

use crate::api::{db_error_response, error_response};
use crate::entities::story::{self, Entity as StoryEntity};
use crate::middleware::logging::to_response;

pub fn story_router() -> Router {
    Router::new()
        .route("/stories", get(get_stories))
        .route("/stories/:id", get(get_story))
}

async fn get_stories(Extension(db): Extension<Arc<DatabaseConnection>>) -> Response {
    match StoryEntity::find()
        .order_by_desc(story::Column::CreatedAt)
        .all(&*db)
        .await
    {
        Ok(stories) => {
            let response: Vec<StoryResponse> =
                stories.into_iter().map(StoryResponse::new).collect();
            to_response((StatusCode::OK, Json(response)), Ok(()))
        }
        Err(err) => db_error_response(err),
    }
}

async fn get_story(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Response {
    match StoryEntity::find_by_id(id).one(&*db).await {
        Ok(Some(story)) => to_response((StatusCode::OK, Json(StoryResponse::new(story))), Ok(())),
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            format!("No story with {} id was found.", id),
        ),
        Err(err) => db_error_response(err),
    }
}

#[derive(Serialize)]
pub(crate) struct StoryResponse {
    id: i32,
    artisan_id: i32,
    title: String,
    content: String,
    tags: Vec<String>,
    created_at: DateTime<Utc>,
}

impl StoryResponse {
    pub(crate) fn new(value: story::Model) -> StoryResponse {
        StoryResponse {
            tags: value.tag_list().into_iter().map(str::to_owned).collect(),
            id: value.id,
            artisan_id: value.artisan_id,
            title: value.title,
            content: value.content,
            created_at: value.created_at,
        }
    }
}
