use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};
use sea_orm::{
    sea_query::{Expr, Func},
    ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use crate::api::public::{product::ProductResponse, story::StoryResponse};
use crate::api::{db_error_response, error_response};
use crate::entities::{artisan, artisan::Entity as ArtisanEntity, product, story};
use crate::middleware::logging::to_response;

pub fn artisan_router() -> Router {
    Router::new()
        .route("/artisans", get(get_artisans))
        .route("/artisans/:id", get(get_artisan))
}

async fn get_artisans(
    Query(params): Query<ArtisansQuery>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Response {
    let mut finder = ArtisanEntity::find();

    if let Some(query) = params.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        finder = finder.filter(matching(query));
    }

    let craft = params
        .craft
        .as_deref()
        .map(str::trim)
        .filter(|craft| !craft.is_empty() && *craft != "all");
    if let Some(craft) = craft {
        finder = finder.filter(
            Expr::expr(Func::lower(Expr::col(artisan::Column::Craft))).eq(craft.to_lowercase()),
        );
    }

    let artisans = match finder.order_by_asc(artisan::Column::ShopName).all(&*db).await {
        Ok(artisans) => artisans,
        Err(err) => return db_error_response(err),
    };

    let crafts = match distinct_crafts(&db).await {
        Ok(crafts) => crafts,
        Err(err) => return db_error_response(err),
    };

    let artisans: Vec<ArtisanResponse> = artisans.into_iter().map(ArtisanResponse::new).collect();
    to_response(
        (
            StatusCode::OK,
            Json(json!({
                "artisans": artisans,
                "crafts": crafts,
                "selected_craft": craft,
                "query": params.q,
            })),
        ),
        Ok(()),
    )
}

async fn get_artisan(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Response {
    let artisan = match ArtisanEntity::find_by_id(id).one(&*db).await {
        Ok(Some(artisan)) => artisan,
        Ok(None) => {
            return error_response(
                StatusCode::NOT_FOUND,
                format!("No artisan with {} id was found.", id),
            )
        }
        Err(err) => return db_error_response(err),
    };

    let products = match artisan
        .find_related(product::Entity)
        .order_by_desc(product::Column::CreatedAt)
        .all(&*db)
        .await
    {
        Ok(products) => products,
        Err(err) => return db_error_response(err),
    };

    let stories = match artisan
        .find_related(story::Entity)
        .order_by_desc(story::Column::CreatedAt)
        .all(&*db)
        .await
    {
        Ok(stories) => stories,
        Err(err) => return db_error_response(err),
    };

    let products: Vec<ProductResponse> = products.into_iter().map(ProductResponse::new).collect();
    let stories: Vec<StoryResponse> = stories.into_iter().map(StoryResponse::new).collect();
    to_response(
        (
            StatusCode::OK,
            Json(json!({
                "artisan": ArtisanResponse::new(artisan),
                "products": products,
                "stories": stories,
            })),
        ),
        Ok(()),
    )
}

/// Substring match over shop name and bio.
pub(crate) fn matching(query: &str) -> Condition {
    Condition::any()
        .add(artisan::Column::ShopName.contains(query))
        .add(artisan::Column::Bio.contains(query))
}

async fn distinct_crafts(db: &DatabaseConnection) -> Result<Vec<String>, DbErr> {
    ArtisanEntity::find()
        .select_only()
        .column(artisan::Column::Craft)
        .distinct()
        .filter(artisan::Column::Craft.ne(""))
        .order_by_asc(artisan::Column::Craft)
        .into_tuple::<String>()
        .all(db)
        .await
}

#[derive(Deserialize)]
struct ArtisansQuery {
    q: Option<String>,
    craft: Option<String>,
}

#[derive(Serialize)]
pub(crate) struct ArtisanResponse {
    id: i32,
    shop_name: String,
    bio: String,
    location: String,
    craft: String,
    website: Option<String>,
    is_verified: bool,
}

impl ArtisanResponse {
    pub(crate) fn new(value: artisan::Model) -> ArtisanResponse {
        ArtisanResponse {
            id: value.id,
            shop_name: value.shop_name,
            bio: value.bio,
            location: value.location,
            craft: value.craft,
            website: value.website,
            is_verified: value.is_verified,
        }
    }
}
