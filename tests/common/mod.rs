#![allow(dead_code)]

use rari_market::{build_app, config::AppConfig};
use reqwest::{header, Client, StatusCode};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::str::FromStr;
use tokio::net::TcpListener;

pub const PASSWORD: &str = "Secret15";
pub const CUSTOMER: &str = "customer@rari.local";
pub const ARTISAN: &str = "artisan@rari.local";
pub const ADMIN: &str = "admin@rari.local";

pub struct TestApp {
    pub address: String,
    pub client: Client,
}

/// Starts the server on a random port with a fresh, seeded sqlite file.
pub async fn spawn_app() -> TestApp {
    let db_path = std::env::temp_dir().join(format!("rari-{}.db", uuid::Uuid::new_v4()));
    let config = AppConfig {
        database_url: format!("sqlite://{}?mode=rwc", db_path.display()),
        secret: "integration-test-secret".to_owned(),
        bind_addr: "127.0.0.1:0".to_owned(),
        token_ttl_hours: 1,
        seed_demo_data: true,
    };

    let app = build_app(config).await.expect("Failed to build app");
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let address = format!(
        "http://{}",
        listener.local_addr().expect("Failed to read local address")
    );
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server crashed");
    });

    TestApp {
        address,
        client: Client::new(),
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn login(&self, email: &str) -> String {
        let response = self
            .client
            .post(self.url("/login"))
            .json(&json!({ "email": email, "password": PASSWORD }))
            .send()
            .await
            .expect("Failed to send login request");
        assert_eq!(response.status(), StatusCode::OK);

        let body = response
            .json::<Value>()
            .await
            .expect("Failed to parse login response JSON");
        body["token"]
            .as_str()
            .expect("Token not found in login response")
            .to_owned()
    }

    pub async fn register_customer(&self, email: &str) -> String {
        let response = self
            .client
            .post(self.url("/register"))
            .json(&json!({
                "user_type": "customer",
                "full_name": "Second Customer",
                "email": email,
                "password": PASSWORD,
                "confirm_password": PASSWORD,
            }))
            .send()
            .await
            .expect("Failed to send register request");
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = response
            .json::<Value>()
            .await
            .expect("Failed to parse register response JSON");
        body["token"]
            .as_str()
            .expect("Token not found in register response")
            .to_owned()
    }

    pub async fn product_id(&self, name: &str) -> i64 {
        let body = self
            .client
            .get(self.url("/api/products"))
            .query(&[("q", name)])
            .send()
            .await
            .expect("Failed to send product search request")
            .json::<Value>()
            .await
            .expect("Failed to parse product search JSON");
        body["items"][0]["id"]
            .as_i64()
            .expect("Product not found in search results")
    }
}

pub fn bearer(token: &str) -> header::HeaderMap {
    let mut headers = header::HeaderMap::new();
    headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {}", token))
            .expect("Failed to create Authorization header"),
    );
    headers
}

/// Money fields serialize as strings; compare them numerically.
pub fn money(value: &Value) -> Decimal {
    match value {
        Value::String(text) => Decimal::from_str(text).expect("Invalid decimal string"),
        Value::Number(number) => {
            Decimal::from_str(&number.to_string()).expect("Invalid decimal number")
        }
        other => panic!("Expected a money value, got {other}"),
    }
}
