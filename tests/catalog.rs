mod common;

use common::{money, spawn_app};
use reqwest::StatusCode;
use rust_decimal_macros::dec;
use serde_json::Value;

async fn get_json(app: &common::TestApp, path: &str, query: &[(&str, &str)]) -> Value {
    let response = app
        .client
        .get(app.url(path))
        .query(query)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
    response
        .json::<Value>()
        .await
        .expect("Failed to parse response JSON")
}

#[tokio::test]
async fn test_product_listing_shows_discount_summary() {
    let app = spawn_app().await;

    let body = get_json(&app, "/api/products", &[("sort", "price_asc")]).await;
    assert_eq!(body["page"], 1);
    assert_eq!(body["total_items"], 2);

    let items = body["items"].as_array().expect("items should be an array");
    let cup = items
        .iter()
        .find(|item| item["name"] == "Glazed Tea Cup")
        .expect("Tea cup missing");
    assert_eq!(money(&cup["savings"]), dec!(2.00));
    assert_eq!(cup["discount_percent"], 25);
    assert_eq!(money(&cup["unit_price"]), dec!(6.00));

    let vase = items
        .iter()
        .find(|item| item["name"] == "Terracotta Vase")
        .expect("Vase missing");
    assert!(vase["savings"].is_null());
    assert!(vase["discount_percent"].is_null());
}

#[tokio::test]
async fn test_product_search_and_page_clamp() {
    let app = spawn_app().await;

    let body = get_json(&app, "/api/products", &[("q", "Vase"), ("page", "99")]).await;
    assert_eq!(body["page"], 1);
    let items = body["items"].as_array().expect("items should be an array");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], "Terracotta Vase");
}

#[tokio::test]
async fn test_missing_product_is_not_found() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(app.url("/api/products/4242"))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_category_detail_lists_products() {
    let app = spawn_app().await;

    let categories = get_json(&app, "/api/categories", &[]).await;
    let pottery = categories
        .as_array()
        .and_then(|list| list.iter().find(|c| c["name"] == "Pottery"))
        .expect("Pottery category missing");
    assert_eq!(pottery["slug"], "pottery");

    let id = pottery["id"].as_i64().expect("Category id missing");
    let detail = get_json(&app, &format!("/api/categories/{}", id), &[]).await;
    assert_eq!(detail["products"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn test_artisan_filter_by_craft_is_case_insensitive() {
    let app = spawn_app().await;

    let body = get_json(&app, "/api/artisans", &[("craft", "pottery")]).await;
    assert_eq!(body["artisans"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["crafts"][0], "Pottery");

    let body = get_json(&app, "/api/artisans", &[("craft", "Glass")]).await;
    assert_eq!(body["artisans"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn test_home_search_by_type() {
    let app = spawn_app().await;

    let body = get_json(&app, "/api/home", &[]).await;
    assert_eq!(body["total_products"], 2);
    assert_eq!(body["search_type"], "all");

    let body = get_json(&app, "/api/home", &[("q", "Cup"), ("type", "product")]).await;
    let products = body["products"].as_array().expect("products should be an array");
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["name"], "Glazed Tea Cup");
    // other sections are not filtered by a product search
    assert_eq!(body["categories"].as_array().map(Vec::len), Some(1));
}
