use std::sync::Arc;

use axum::http::{HeaderValue, StatusCode, header};
use axum_test::TestServer;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
use serde_json::{Value, json};

use echosavvy_auth_types::token::validate_session_token;
use echosavvy_domain::id::UserId;
use echosavvy_shop::router::build_router;
use echosavvy_shop::state::AppState;
use echosavvy_shop_schema::{cart, products, users};
use echosavvy_testing::auth::{MockSession, test_secret};
use echosavvy_testing::authenticator::{TEST_ORIGIN, TEST_RP_ID, TestAuthenticator};

use crate::helpers::test_relying_party;

fn server(db: DatabaseConnection) -> TestServer {
    let state = AppState {
        db: Arc::new(db),
        jwt_secret: test_secret(),
        relying_party: test_relying_party(),
    };
    TestServer::new(build_router(state)).unwrap()
}

fn empty_db() -> DatabaseConnection {
    MockDatabase::new(DatabaseBackend::MySql).into_connection()
}

fn exec(rows_affected: u64) -> MockExecResult {
    MockExecResult {
        last_insert_id: 0,
        rows_affected,
    }
}

fn product_row(id: i32, name: &str, rupees: i64) -> products::Model {
    products::Model {
        id,
        name: name.to_owned(),
        category: "Accessories".to_owned(),
        price: Decimal::new(rupees * 100, 2),
        description: format!("{name} for testing"),
        image_url: format!("/image/{id}.png"),
    }
}

fn user_row(authenticator: &TestAuthenticator, challenge: Option<&str>) -> users::Model {
    let now = Utc::now();
    users::Model {
        id: 4,
        username: "asha".to_owned(),
        phone: "9876543210".to_owned(),
        credential_id: authenticator.credential_id(),
        public_key: authenticator.public_key_spki(),
        challenge: challenge.map(str::to_owned),
        challenge_expires_at: challenge.map(|_| now + Duration::seconds(60)),
        token: None,
        created_at: now,
    }
}

fn cart_row(id: i32, user_id: i32, product: &products::Model, quantity: i32) -> cart::Model {
    let now = Utc::now();
    cart::Model {
        id,
        user_id,
        product_id: product.id,
        product_name: product.name.clone(),
        price: product.price,
        quantity,
        image_url: product.image_url.clone(),
        total_amount: product.price * Decimal::from(quantity),
        created_at: now,
        updated_at: now,
    }
}

// ── health ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_answer_liveness_check() {
    let response = server(empty_db()).get("/healthz").await;
    response.assert_status_ok();
}

// ── body validation ──────────────────────────────────────────────────────────

#[tokio::test]
async fn should_return_400_for_missing_signup_fields() {
    let response = server(empty_db())
        .post("/api/signup")
        .json(&json!({ "username": "asha", "phone": "" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["kind"], "MISSING_FIELDS");
}

#[tokio::test]
async fn should_return_400_for_missing_login_fields() {
    let response = server(empty_db())
        .post("/api/login")
        .json(&json!({ "username": "asha", "credential_id": "AQID" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["kind"], "MISSING_FIELDS");
}

#[tokio::test]
async fn should_return_400_for_non_json_body() {
    let response = server(empty_db())
        .post("/api/get-challenge")
        .text("username=asha")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["kind"], "MALFORMED_BODY");
}

#[tokio::test]
async fn should_return_400_for_mistyped_field() {
    let session = MockSession::new(4, "asha");
    let response = server(empty_db())
        .post("/api/cart/add")
        .add_header(header::AUTHORIZATION, session.bearer())
        .json(&json!({ "product_id": "twenty-two" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["kind"], "MALFORMED_BODY");
}

#[tokio::test]
async fn should_return_400_for_missing_product_id() {
    let session = MockSession::new(4, "asha");
    let response = server(empty_db())
        .put("/api/cart/update")
        .add_header(header::AUTHORIZATION, session.bearer())
        .json(&json!({ "quantity": 2 }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["kind"], "MISSING_FIELDS");
}

// ── session ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_return_401_without_bearer_token() {
    let response = server(empty_db()).get("/api/cart").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["kind"], "UNAUTHORIZED");
}

#[tokio::test]
async fn should_return_403_for_invalid_bearer_token() {
    let response = server(empty_db())
        .delete("/api/cart")
        .add_header(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer not-a-jwt"),
        )
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
    let body: Value = response.json();
    assert_eq!(body["kind"], "INVALID_TOKEN");
}

// ── auth flow ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_sign_up_new_user() {
    let authenticator = TestAuthenticator::new(5);
    let db = MockDatabase::new(DatabaseBackend::MySql)
        .append_query_results([Vec::<users::Model>::new()])
        .append_exec_results([MockExecResult {
            last_insert_id: 4,
            rows_affected: 1,
        }])
        .into_connection();

    let response = server(db)
        .post("/api/signup")
        .json(&json!({
            "username": "asha",
            "phone": "9876543210",
            "credential_id": authenticator.credential_id_standard(),
            "public_key": authenticator.public_key_spki(),
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn should_return_400_for_taken_username() {
    let authenticator = TestAuthenticator::new(5);
    let db = MockDatabase::new(DatabaseBackend::MySql)
        .append_query_results([vec![user_row(&authenticator, None)]])
        .into_connection();

    let response = server(db)
        .post("/api/signup")
        .json(&json!({
            "username": "asha",
            "phone": "9876543210",
            "credential_id": authenticator.credential_id(),
            "public_key": authenticator.public_key_spki(),
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["kind"], "USERNAME_TAKEN");
}

#[tokio::test]
async fn should_return_404_challenge_for_unknown_user() {
    let db = MockDatabase::new(DatabaseBackend::MySql)
        .append_query_results([Vec::<users::Model>::new()])
        .into_connection();

    let response = server(db)
        .post("/api/get-challenge")
        .json(&json!({ "username": "nobody" }))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["kind"], "USER_NOT_FOUND");
}

#[tokio::test]
async fn should_issue_login_challenge() {
    let authenticator = TestAuthenticator::new(5);
    let db = MockDatabase::new(DatabaseBackend::MySql)
        .append_query_results([vec![user_row(&authenticator, None)]])
        .append_exec_results([exec(1)])
        .into_connection();

    let response = server(db)
        .post("/api/get-challenge")
        .json(&json!({ "username": "asha" }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["credential_id"], authenticator.credential_id());
    assert_eq!(body["challenge"].as_str().unwrap().len(), 43);
}

#[tokio::test]
async fn should_log_in_with_signed_assertion() {
    let authenticator = TestAuthenticator::new(5);
    let challenge = "c2VydmVyLWlzc3VlZC1jaGFsbGVuZ2UtZm9yLXRlc3Rz";
    let db = MockDatabase::new(DatabaseBackend::MySql)
        .append_query_results([vec![user_row(&authenticator, Some(challenge))]])
        .append_exec_results([exec(1), exec(1)])
        .into_connection();

    let signed = authenticator.assert(challenge, TEST_ORIGIN, TEST_RP_ID);
    let response = server(db)
        .post("/api/login")
        .json(&signed.login_body("asha", &authenticator.credential_id_standard()))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["user_id"], 4);
    let token = body["token"].as_str().unwrap();
    let info = validate_session_token(token, &test_secret()).unwrap();
    assert_eq!(info.user_id, UserId(4));
}

#[tokio::test]
async fn should_return_401_when_challenge_already_consumed() {
    let authenticator = TestAuthenticator::new(5);
    let challenge = "c2VydmVyLWlzc3VlZC1jaGFsbGVuZ2UtZm9yLXRlc3Rz";
    let db = MockDatabase::new(DatabaseBackend::MySql)
        .append_query_results([vec![user_row(&authenticator, Some(challenge))]])
        // A concurrent login won the race.
        .append_exec_results([exec(0)])
        .into_connection();

    let signed = authenticator.assert(challenge, TEST_ORIGIN, TEST_RP_ID);
    let response = server(db)
        .post("/api/login")
        .json(&signed.login_body("asha", &authenticator.credential_id()))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["kind"], "CHALLENGE_EXPIRED");
}

#[tokio::test]
async fn should_return_401_for_forged_assertion() {
    let authenticator = TestAuthenticator::new(5);
    let challenge = "c2VydmVyLWlzc3VlZC1jaGFsbGVuZ2UtZm9yLXRlc3Rz";
    let db = MockDatabase::new(DatabaseBackend::MySql)
        .append_query_results([vec![user_row(&authenticator, Some(challenge))]])
        .append_exec_results([exec(1)])
        .into_connection();

    let forged = TestAuthenticator::new(6).assert(challenge, TEST_ORIGIN, TEST_RP_ID);
    let response = server(db)
        .post("/api/login")
        .json(&forged.login_body("asha", &authenticator.credential_id()))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["kind"], "INVALID_ASSERTION");
}

// ── catalog ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_list_products() {
    let db = MockDatabase::new(DatabaseBackend::MySql)
        .append_query_results([vec![
            product_row(22, "Smartphone", 12000),
            product_row(23, "Laptop", 55999),
        ]])
        .into_connection();

    let response = server(db).get("/api/products").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["products"][0]["id"], 22);
    assert_eq!(body["products"][0]["price"], "12000.00");
    assert_eq!(body["products"][1]["image"], "/image/23.png");
}

#[tokio::test]
async fn should_return_404_for_unknown_product() {
    let db = MockDatabase::new(DatabaseBackend::MySql)
        .append_query_results([Vec::<products::Model>::new()])
        .into_connection();

    let response = server(db).get("/api/products/41").await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["kind"], "PRODUCT_NOT_FOUND");
}

#[tokio::test]
async fn should_return_404_for_non_numeric_product_id() {
    let response = server(empty_db()).get("/api/products/phone").await;
    response.assert_status(StatusCode::NOT_FOUND);
}

// ── cart ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_list_cart_for_session_user() {
    let phone = product_row(22, "Smartphone", 12000);
    let db = MockDatabase::new(DatabaseBackend::MySql)
        .append_query_results([vec![cart_row(1, 4, &phone, 2)]])
        .into_connection();
    let session = MockSession::new(4, "asha");

    let response = server(db)
        .get("/api/cart")
        .add_header(header::AUTHORIZATION, session.bearer())
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["user_id"], 4);
    assert_eq!(body[0]["total_amount"], "24000.00");
}

#[tokio::test]
async fn should_add_to_cart_with_catalog_price() {
    let keyboard = product_row(36, "Keyboard", 4500);
    let db = MockDatabase::new(DatabaseBackend::MySql)
        .append_query_results([vec![keyboard.clone()]])
        .append_query_results([Vec::<cart::Model>::new()])
        .append_exec_results([exec(1)])
        .append_query_results([vec![cart_row(9, 4, &keyboard, 1)]])
        .into_connection();
    let session = MockSession::new(4, "asha");

    let response = server(db)
        .post("/api/cart/add")
        .add_header(header::AUTHORIZATION, session.bearer())
        .json(&json!({ "product_id": 36 }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["item"]["product_name"], "Keyboard");
    assert_eq!(body["item"]["quantity"], 1);
    assert_eq!(body["item"]["total_amount"], "4500.00");
}

#[tokio::test]
async fn should_return_400_for_zero_quantity() {
    let session = MockSession::new(4, "asha");
    let response = server(empty_db())
        .post("/api/cart/add")
        .add_header(header::AUTHORIZATION, session.bearer())
        .json(&json!({ "product_id": 36, "quantity": 0 }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["kind"], "INVALID_QUANTITY");
}

#[tokio::test]
async fn should_return_404_when_removing_absent_line() {
    let db = MockDatabase::new(DatabaseBackend::MySql)
        .append_exec_results([exec(0)])
        .into_connection();
    let session = MockSession::new(4, "asha");

    let response = server(db)
        .delete("/api/cart/remove")
        .add_header(header::AUTHORIZATION, session.bearer())
        .json(&json!({ "product_id": 22 }))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["kind"], "CART_ITEM_NOT_FOUND");
}

#[tokio::test]
async fn should_clear_cart_with_204() {
    let db = MockDatabase::new(DatabaseBackend::MySql)
        .append_exec_results([exec(3)])
        .into_connection();
    let session = MockSession::new(4, "asha");

    let response = server(db)
        .delete("/api/cart")
        .add_header(header::AUTHORIZATION, session.bearer())
        .await;

    response.assert_status(StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn should_stamp_request_id_on_responses() {
    let response = server(empty_db()).get("/healthz").await;
    assert!(response.headers().contains_key("x-request-id"));
}

