use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Select,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use crate::api::{db_error_response, error_response, PAGE_SIZE};
use crate::entities::product::{self, Entity as ProductEntity};
use crate::middleware::logging::to_response;
use crate::pricing::{DiscountSummary, StarRating};

pub fn product_router() -> Router {
    Router::new()
        .route("/products", get(get_products))
        .route("/products/:id", get(get_product))
}

async fn get_products(
    Query(params): Query<GetProductsQuery>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Response {
    let mut finder = ProductEntity::find();

    if let Some(category_id) = params.category {
        finder = finder.filter(product::Column::CategoryId.eq(category_id));
    }

    if let Some(query) = params.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        finder = finder.filter(matching(query));
    }

    let finder = sorted(finder, params.sort);
    let paginator = finder.paginate(&*db, PAGE_SIZE);

    let (total_items, total_pages) = match paginator.num_items_and_pages().await {
        Ok(counts) => (counts.number_of_items, counts.number_of_pages),
        Err(err) => return db_error_response(err),
    };

    // Out of range pages fall back to the nearest valid one.
    let page = params.page.unwrap_or(1).clamp(1, total_pages.max(1));

    match paginator.fetch_page(page - 1).await {
        Ok(products) => {
            let items: Vec<ProductResponse> =
                products.into_iter().map(ProductResponse::new).collect();
            to_response(
                (
                    StatusCode::OK,
                    Json(json!({
                        "items": items,
                        "page": page,
                        "total_pages": total_pages,
                        "total_items": total_items,
                    })),
                ),
                Ok(()),
            )
        }
        Err(err) => db_error_response(err),
    }
}

async fn get_product(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Response {
    match ProductEntity::find_by_id(id).one(&*db).await {
        Ok(Some(prod)) => to_response(
            (StatusCode::OK, Json(ProductResponse::new(prod))),
            Ok(()),
        ),
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            format!("No product with {} id was found.", id),
        ),
        Err(err) => db_error_response(err),
    }
}

/// Substring match over name and description.
pub(crate) fn matching(query: &str) -> Condition {
    Condition::any()
        .add(product::Column::Name.contains(query))
        .add(product::Column::Description.contains(query))
}

fn sorted(finder: Select<ProductEntity>, sort: Option<ProductSort>) -> Select<ProductEntity> {
    let finder = match sort {
        Some(ProductSort::PriceAsc) => finder
            .order_by_asc(product::Column::DiscountPrice)
            .order_by_asc(product::Column::Price),
        Some(ProductSort::PriceDesc) => finder
            .order_by_desc(product::Column::DiscountPrice)
            .order_by_desc(product::Column::Price),
        Some(ProductSort::Newest) => finder.order_by_desc(product::Column::CreatedAt),
        Some(ProductSort::BestRated) => finder.order_by_desc(product::Column::Rating),
        None => finder,
    };
    // stable pages
    finder.order_by_asc(product::Column::Id)
}

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
enum ProductSort {
    PriceAsc,
    PriceDesc,
    Newest,
    BestRated,
}

#[derive(Deserialize)]
struct GetProductsQuery {
    category: Option<i32>,
    sort: Option<ProductSort>,
    q: Option<String>,
    page: Option<u64>,
}

#[derive(Serialize)]
pub(crate) struct ProductResponse {
    id: i32,
    artisan_id: i32,
    category_id: Option<i32>,
    name: String,
    slug: String,
    description: String,
    price: Decimal,
    discount_price: Option<Decimal>,
    unit_price: Decimal,
    #[serde(flatten)]
    discount: DiscountSummary,
    stock: i32,
    is_featured: bool,
    is_new: bool,
    is_on_sale: bool,
    rating: f64,
    rating_count: i32,
    stars: StarRating,
}

impl ProductResponse {
    pub(crate) fn new(value: product::Model) -> ProductResponse {
        ProductResponse {
            unit_price: value.unit_price(),
            discount: DiscountSummary::compute(value.price, value.discount_price),
            stars: StarRating::from_rating(value.rating),
            id: value.id,
            artisan_id: value.artisan_id,
            category_id: value.category_id,
            name: value.name,
            slug: value.slug,
            description: value.description,
            price: value.price,
            discount_price: value.discount_price,
            stock: value.stock,
            is_featured: value.is_featured,
            is_new: value.is_new,
            is_on_sale: value.is_on_sale,
            rating: value.rating,
            rating_count: value.rating_count,
        }
    }
}
