use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::api::db_error_response;
use crate::api::public::{
    artisan::{self as artisan_api, ArtisanResponse},
    category::CategoryResponse,
    product::{self as product_api, ProductResponse},
    story::StoryResponse,
};
use crate::entities::{artisan, category, product, story};
use crate::middleware::logging::to_response;

const HOME_PRODUCTS: u64 = 8;
const HOME_STORIES: u64 = 3;

pub fn home_router() -> Router {
    Router::new().route("/home", get(get_home))
}

async fn get_home(
    Query(params): Query<HomeQuery>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Response {
    match build_home(&db, params).await {
        Ok(body) => to_response((StatusCode::OK, Json(body)), Ok(())),
        Err(err) => db_error_response(err),
    }
}

async fn build_home(db: &DatabaseConnection, params: HomeQuery) -> Result<Value, DbErr> {
    let search_type = params.search_type.unwrap_or_default();
    let query = params.q.unwrap_or_default();
    let needle = query.trim();
    let searching = !needle.is_empty();

    let mut products = product::Entity::find().order_by_desc(product::Column::CreatedAt);
    let mut categories = category::Entity::find().order_by_asc(category::Column::Name);
    let mut artisans = artisan::Entity::find().order_by_asc(artisan::Column::ShopName);

    if searching {
        if matches!(search_type, SearchType::All | SearchType::Product) {
            products = products.filter(product_api::matching(needle));
        }
        if matches!(search_type, SearchType::All | SearchType::Category) {
            categories = categories.filter(category::Column::Name.contains(needle));
        }
        if matches!(search_type, SearchType::All | SearchType::Artisan) {
            artisans = artisans.filter(artisan_api::matching(needle));
        }
    }

    let products: Vec<ProductResponse> = products
        .limit(HOME_PRODUCTS)
        .all(db)
        .await?
        .into_iter()
        .map(ProductResponse::new)
        .collect();
    let categories: Vec<CategoryResponse> = categories
        .all(db)
        .await?
        .into_iter()
        .map(CategoryResponse::new)
        .collect();
    let artisans: Vec<ArtisanResponse> = artisans
        .all(db)
        .await?
        .into_iter()
        .map(ArtisanResponse::new)
        .collect();
    let stories: Vec<StoryResponse> = story::Entity::find()
        .order_by_desc(story::Column::CreatedAt)
        .limit(HOME_STORIES)
        .all(db)
        .await?
        .into_iter()
        .map(StoryResponse::new)
        .collect();
    let total_products = product::Entity::find().count(db).await?;

    Ok(json!({
        "products": products,
        "categories": categories,
        "artisans": artisans,
        "stories": stories,
        "total_products": total_products,
        "query": query,
        "search_type": search_type,
    }))
}

#[derive(Deserialize, serde::Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum SearchType {
    #[default]
    All,
    Product,
    Category,
    Artisan,
}

#[derive(Deserialize)]
struct HomeQuery {
    q: Option<String>,
    #[serde(rename = "type")]
    search_type: Option<SearchType>,
}
