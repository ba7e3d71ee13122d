mod common;

use common::{bearer, spawn_app, CUSTOMER, PASSWORD};
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn test_register_customer_logs_in() {
    let app = spawn_app().await;

    let token = app.register_customer("new@rari.local").await;

    // A fresh customer starts with an empty cart
    let response = app
        .client
        .get(app.url("/api/cart"))
        .headers(bearer(&token))
        .send()
        .await
        .expect("Failed to send get cart request");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_register_duplicate_email_is_conflict() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/register"))
        .json(&json!({
            "user_type": "customer",
            "full_name": "Copy Cat",
            "email": CUSTOMER,
            "password": PASSWORD,
            "confirm_password": PASSWORD,
        }))
        .send()
        .await
        .expect("Failed to send register request");

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_register_rejects_mismatched_passwords() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/register"))
        .json(&json!({
            "user_type": "customer",
            "full_name": "Typo",
            "email": "typo@rari.local",
            "password": "Secret15",
            "confirm_password": "Secret16",
        }))
        .send()
        .await
        .expect("Failed to send register request");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_register_artisan_needs_shop_details() {
    let app = spawn_app().await;

    let without_shop = app
        .client
        .post(app.url("/register"))
        .json(&json!({
            "user_type": "artisan",
            "full_name": "Weaver",
            "email": "weaver@rari.local",
            "password": PASSWORD,
            "confirm_password": PASSWORD,
        }))
        .send()
        .await
        .expect("Failed to send register request");
    assert_eq!(without_shop.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let with_shop = app
        .client
        .post(app.url("/register"))
        .json(&json!({
            "user_type": "artisan",
            "full_name": "Weaver",
            "email": "weaver@rari.local",
            "password": PASSWORD,
            "confirm_password": PASSWORD,
            "shop_name": "Loom House",
            "phone_number": "+880 1711 000000",
        }))
        .send()
        .await
        .expect("Failed to send register request");
    assert_eq!(with_shop.status(), StatusCode::CREATED);
    let body = with_shop
        .json::<Value>()
        .await
        .expect("Failed to parse register response JSON");
    assert_eq!(body["role"], "artisan");

    let artisans = app
        .client
        .get(app.url("/api/artisans"))
        .query(&[("q", "Loom")])
        .send()
        .await
        .expect("Failed to send artisans request")
        .json::<Value>()
        .await
        .expect("Failed to parse artisans JSON");
    assert_eq!(artisans["artisans"][0]["shop_name"], "Loom House");
}

#[tokio::test]
async fn test_login_with_wrong_password_is_unauthorized() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/login"))
        .json(&json!({ "email": CUSTOMER, "password": "wrong-password" }))
        .send()
        .await
        .expect("Failed to send login request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_acknowledges() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/logout"))
        .send()
        .await
        .expect("Failed to send logout request");

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_role_gates() {
    let app = spawn_app().await;
    let customer = app.login(CUSTOMER).await;

    // No token
    let response = app
        .client
        .get(app.url("/api/wishlist"))
        .send()
        .await
        .expect("Failed to send wishlist request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Wrong role
    let response = app
        .client
        .post(app.url("/api/admin/categories"))
        .headers(bearer(&customer))
        .json(&json!({ "name": "Weaving" }))
        .send()
        .await
        .expect("Failed to send create category request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Garbage token on the cart is treated as anonymous
    let response = app
        .client
        .get(app.url("/api/cart"))
        .headers(bearer("not-a-token"))
        .send()
        .await
        .expect("Failed to send get cart request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
