#![allow(dead_code, unused_macros)]

use actix_web::test;
use bloodlink_api::infrastructure::security::TokenKeys;
use serde_json::json;

pub const JWT_SECRET: &str = "test-secret-key-for-integration-tests";

pub fn token_keys() -> TokenKeys {
    TokenKeys::new(JWT_SECRET, Vec::new(), chrono::Duration::hours(1))
}

macro_rules! setup_test {
    () => {{
        use actix_web::{App, test, web};
        use bloodlink_api::data::account_repository::InMemoryAccountRepository;
        use bloodlink_api::data::memory::InMemoryInventoryRepository;
        use bloodlink_api::presentation::handlers::AppState;
        use bloodlink_api::presentation::middleware::{JwtAuthMiddleware, RequestTracing};
        use bloodlink_api::presentation::routes::configure;
        use std::sync::Arc;

        let keys = common::token_keys();
        let state = web::Data::new(AppState::new(
            Arc::new(InMemoryAccountRepository::new()),
            Arc::new(InMemoryInventoryRepository::new()),
            keys.clone(),
            "Tripura",
        ));

        test::init_service(
            App::new()
                .app_data(state.clone())
                .wrap(JwtAuthMiddleware::new(keys))
                .wrap(RequestTracing)
                .configure(configure),
        )
        .await
    }};
}

/// Signs in and returns the bearer token.
macro_rules! signin {
    ($app:expr, $path:expr, $name:expr) => {{
        let req = actix_web::test::TestRequest::post()
            .uri($path)
            .set_json(serde_json::json!({ "name": $name, "password": "secret123" }))
            .to_request();
        let resp = actix_web::test::call_service(&$app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::OK);
        let body: serde_json::Value = actix_web::test::read_body_json(resp).await;
        body["token"].as_str().unwrap().to_string()
    }};
}

pub fn bank_signup(name: &str, district: &str) -> test::TestRequest {
    test::TestRequest::post().uri("/bloodbank/signup").set_json(json!({
        "name": name,
        "email": format!("{}@bank.example.com", name.to_lowercase().replace(' ', "")),
        "password": "secret123",
        "number": "9876543210",
        "state": "Tripura",
        "district": district,
    }))
}

pub fn donor_signup(name: &str, subdivision: &str, blood_type: &str) -> test::TestRequest {
    test::TestRequest::post().uri("/blooddonor/signup").set_json(json!({
        "name": name,
        "email": format!("{}@donor.example.com", name.to_lowercase().replace(' ', "")),
        "password": "secret123",
        "number": "9123456780",
        "state": "Tripura",
        "subdivision": subdivision,
        "bloodType": blood_type,
    }))
}

pub fn quantities(a_positive: i64) -> serde_json::Value {
    json!({
        "A_positive": a_positive,
        "A_negative": 0,
        "B_positive": 0,
        "B_negative": 0,
        "O_positive": 0,
        "O_negative": 0,
        "AB_positive": 0,
        "AB_negative": 0,
    })
}

pub fn search(path: &str, subdivision: &str, blood_type: &str) -> test::TestRequest {
    test::TestRequest::post().uri(path).set_json(json!({
        "state": "Tripura",
        "subdivision": subdivision,
        "bloodType": blood_type,
    }))
}
