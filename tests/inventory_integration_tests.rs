#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use bloodlink_api::domain::account::AccountKind;
use bloodlink_api::infrastructure::security::generate_token;
use serde_json::json;

#[actix_web::test]
async fn test_add_bloods_creates_then_overwrites() {
    let app = setup_test!();

    let req = common::bank_signup("City Blood Bank", "Sadar").to_request();
    test::call_service(&app, req).await;
    let token = signin!(app, "/bloodbank/signin", "City Blood Bank");

    let req = test::TestRequest::post()
        .uri("/bloodbank/add-bloods")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(common::quantities(5))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Blood quantities added successfully.");

    // Second write replaces the first rather than adding to it
    let req = test::TestRequest::post()
        .uri("/bloodbank/add-bloods")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(common::quantities(2))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Blood quantities updated successfully.");

    let req = test::TestRequest::get()
        .uri("/bloodbank/inventory")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["quantities"]["A_positive"], 2);
    assert_eq!(body["quantities"]["AB_negative"], 0);
    assert!(body["last_updated"].is_string());
}

#[actix_web::test]
async fn test_add_bloods_rejects_missing_or_negative_fields() {
    let app = setup_test!();

    let req = common::bank_signup("City Blood Bank", "Sadar").to_request();
    test::call_service(&app, req).await;
    let token = signin!(app, "/bloodbank/signin", "City Blood Bank");

    let mut missing = common::quantities(3);
    missing.as_object_mut().unwrap().remove("O_negative");
    let negative = common::quantities(-1);

    for body in [missing, negative] {
        let req = test::TestRequest::post()
            .uri("/bloodbank/add-bloods")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    // Nothing was stored by the rejected writes
    let req = test::TestRequest::get()
        .uri("/bloodbank/inventory")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_add_bloods_requires_token() {
    let app = setup_test!();

    let req = test::TestRequest::post()
        .uri("/bloodbank/add-bloods")
        .set_json(common::quantities(1))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/bloodbank/add-bloods")
        .insert_header(("Authorization", "Bearer not-a-token"))
        .set_json(common::quantities(1))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_add_bloods_rejects_token_signed_with_other_secret() {
    let app = setup_test!();

    let req = common::bank_signup("City Blood Bank", "Sadar").to_request();
    let resp = test::call_service(&app, req).await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    let bank_id = body["user"]["id"].as_str().unwrap();

    let forged = generate_token(
        bank_id,
        "City Blood Bank",
        AccountKind::Bank,
        "some-other-secret-entirely",
        chrono::Duration::hours(1),
    )
    .unwrap();

    let req = test::TestRequest::post()
        .uri("/bloodbank/add-bloods")
        .insert_header(("Authorization", format!("Bearer {}", forged)))
        .set_json(common::quantities(1))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_donor_token_cannot_add_bloods() {
    let app = setup_test!();

    let req = common::donor_signup("Ravi", "Khowai", "O+").to_request();
    test::call_service(&app, req).await;
    let token = signin!(app, "/blooddonor/signin", "Ravi");

    let req = test::TestRequest::post()
        .uri("/bloodbank/add-bloods")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(common::quantities(1))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::get()
        .uri("/bloodbank/inventory")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_malformed_body_is_bad_request() {
    let app = setup_test!();

    let req = common::bank_signup("City Blood Bank", "Sadar").to_request();
    test::call_service(&app, req).await;
    let token = signin!(app, "/bloodbank/signin", "City Blood Bank");

    let req = test::TestRequest::post()
        .uri("/bloodbank/add-bloods")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{\"A_positive\": ")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/bloodbank/add-bloods")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(json!({ "A_positive": "lots" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
