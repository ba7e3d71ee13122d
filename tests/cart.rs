mod common;

use common::{bearer, money, spawn_app, CUSTOMER};
use reqwest::StatusCode;
use rust_decimal_macros::dec;
use serde_json::Value;

#[tokio::test]
async fn test_anonymous_cart_requires_login() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(app.url("/api/cart"))
        .send()
        .await
        .expect("Failed to send get cart request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response
        .json::<Value>()
        .await
        .expect("Failed to parse get cart response JSON");
    assert_eq!(body["login"], "/login");

    let vase = app.product_id("Terracotta").await;
    let response = app
        .client
        .post(app.url(&format!("/api/cart/add/{}", vase)))
        .send()
        .await
        .expect("Failed to send add to cart request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_add_to_cart_merges_lines_and_totals() {
    let app = spawn_app().await;
    let token = app.login(CUSTOMER).await;
    let vase = app.product_id("Terracotta").await;
    let cup = app.product_id("Tea Cup").await;

    // Step 1: Empty cart has no pending order
    let body = app
        .client
        .get(app.url("/api/cart"))
        .headers(bearer(&token))
        .send()
        .await
        .expect("Failed to send get cart request")
        .json::<Value>()
        .await
        .expect("Failed to parse get cart response JSON");
    assert!(body["order"].is_null());
    assert_eq!(money(&body["total"]), dec!(0));

    // Step 2: Add the vase twice and the discounted cup once
    for product_id in [vase, vase, cup] {
        let response = app
            .client
            .post(app.url(&format!("/api/cart/add/{}", product_id)))
            .headers(bearer(&token))
            .send()
            .await
            .expect("Failed to send add to cart request");
        assert_eq!(response.status(), StatusCode::OK);
    }

    // Step 3: One line per product, discount price applied
    let body = app
        .client
        .get(app.url("/api/cart"))
        .headers(bearer(&token))
        .send()
        .await
        .expect("Failed to send get cart request")
        .json::<Value>()
        .await
        .expect("Failed to parse get cart response JSON");

    let lines = body["lines"].as_array().expect("lines should be an array");
    assert_eq!(lines.len(), 2);
    let vase_line = lines
        .iter()
        .find(|line| line["product_id"].as_i64() == Some(vase))
        .expect("Vase line missing");
    assert_eq!(vase_line["quantity"], 2);
    assert_eq!(money(&vase_line["line_total"]), dec!(50.00));
    let cup_line = lines
        .iter()
        .find(|line| line["product_id"].as_i64() == Some(cup))
        .expect("Cup line missing");
    assert_eq!(money(&cup_line["unit_price"]), dec!(6.00));
    assert_eq!(money(&body["total"]), dec!(56.00));
    assert_eq!(body["order"]["status"], "pending");
}

#[tokio::test]
async fn test_add_unknown_product_is_not_found() {
    let app = spawn_app().await;
    let token = app.login(CUSTOMER).await;

    let response = app
        .client
        .post(app.url("/api/cart/add/9999"))
        .headers(bearer(&token))
        .send()
        .await
        .expect("Failed to send add to cart request");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_checkout_moves_order_to_processing_and_decrements_stock() {
    let app = spawn_app().await;
    let token = app.login(CUSTOMER).await;
    let vase = app.product_id("Terracotta").await;

    for _ in 0..3 {
        let response = app
            .client
            .post(app.url(&format!("/api/cart/add/{}", vase)))
            .headers(bearer(&token))
            .send()
            .await
            .expect("Failed to send add to cart request");
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .client
        .post(app.url("/api/checkout"))
        .headers(bearer(&token))
        .send()
        .await
        .expect("Failed to send checkout request");
    assert_eq!(response.status(), StatusCode::OK);
    let body = response
        .json::<Value>()
        .await
        .expect("Failed to parse checkout response JSON");
    assert_eq!(body["order"]["status"], "processing");

    let product = app
        .client
        .get(app.url(&format!("/api/products/{}", vase)))
        .send()
        .await
        .expect("Failed to send get product request")
        .json::<Value>()
        .await
        .expect("Failed to parse product JSON");
    assert_eq!(product["stock"], 7);

    // The cart is gone, so a second checkout has nothing to place
    let response = app
        .client
        .post(app.url("/api/checkout"))
        .headers(bearer(&token))
        .send()
        .await
        .expect("Failed to send checkout request");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let dashboard = app
        .client
        .get(app.url("/api/dashboard"))
        .headers(bearer(&token))
        .send()
        .await
        .expect("Failed to send dashboard request")
        .json::<Value>()
        .await
        .expect("Failed to parse dashboard JSON");
    let orders = dashboard["orders"]
        .as_array()
        .expect("orders should be an array");
    assert_eq!(orders.len(), 1);
    assert_eq!(money(&orders[0]["total"]), dec!(75.00));
}

#[tokio::test]
async fn test_checkout_without_cart_is_conflict() {
    let app = spawn_app().await;
    let token = app.login(CUSTOMER).await;

    let response = app
        .client
        .post(app.url("/api/checkout"))
        .headers(bearer(&token))
        .send()
        .await
        .expect("Failed to send checkout request");

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_remove_item_of_another_customer_is_forbidden() {
    let app = spawn_app().await;
    let owner = app.login(CUSTOMER).await;
    let intruder = app.register_customer("second@rari.local").await;
    let vase = app.product_id("Terracotta").await;

    let body = app
        .client
        .post(app.url(&format!("/api/cart/add/{}", vase)))
        .headers(bearer(&owner))
        .send()
        .await
        .expect("Failed to send add to cart request")
        .json::<Value>()
        .await
        .expect("Failed to parse add to cart JSON");
    let item_id = body["item"]["id"].as_i64().expect("Item id missing");

    let response = app
        .client
        .delete(app.url(&format!("/api/cart/items/{}", item_id)))
        .headers(bearer(&intruder))
        .send()
        .await
        .expect("Failed to send remove request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .client
        .delete(app.url(&format!("/api/cart/items/{}", item_id)))
        .headers(bearer(&owner))
        .send()
        .await
        .expect("Failed to send remove request");
    assert_eq!(response.status(), StatusCode::OK);

    let body = app
        .client
        .get(app.url("/api/cart"))
        .headers(bearer(&owner))
        .send()
        .await
        .expect("Failed to send get cart request")
        .json::<Value>()
        .await
        .expect("Failed to parse get cart response JSON");
    assert_eq!(body["lines"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn test_adding_beyond_stock_is_conflict() {
    let app = spawn_app().await;
    let admin = app.login(common::ADMIN).await;
    let artisan = app.login(common::ARTISAN).await;
    let token = app.login(CUSTOMER).await;

    // Step 1: Artisan lists a one-off piece
    let response = app
        .client
        .post(app.url("/api/artisan/products"))
        .headers(bearer(&artisan))
        .json(&serde_json::json!({
            "name": "Single Bowl",
            "price": "40.00",
            "stock": 1
        }))
        .send()
        .await
        .expect("Failed to send create product request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let bowl = response
        .json::<Value>()
        .await
        .expect("Failed to parse product JSON")["id"]
        .as_i64()
        .expect("Product id missing");

    // Step 2: First unit fits, the second does not
    let first = app
        .client
        .post(app.url(&format!("/api/cart/add/{}", bowl)))
        .headers(bearer(&token))
        .send()
        .await
        .expect("Failed to send add to cart request");
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .client
        .post(app.url(&format!("/api/cart/add/{}", bowl)))
        .headers(bearer(&token))
        .send()
        .await
        .expect("Failed to send add to cart request");
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let body = second
        .json::<Value>()
        .await
        .expect("Failed to parse conflict JSON");
    assert_eq!(body["available"], 1);

    // Users without a customer profile have no cart
    let response = app
        .client
        .get(app.url("/api/cart"))
        .headers(bearer(&admin))
        .send()
        .await
        .expect("Failed to send get cart request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
