//! Router tests: requests go through the full middleware stack against an
//! in-memory database.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tally_api::{build_router, ApiConfig, AppState};
use tally_db::{Database, DbConfig};
use tower::ServiceExt;

async fn app() -> Router {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let config = ApiConfig {
        http_port: 0,
        database_path: ":memory:".to_string(),
        db_max_connections: 1,
        jwt_secret: "test-secret".to_string(),
        jwt_lifetime_secs: 3600,
    };
    build_router(AppState::new(db, &config))
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

/// Registers `username` and returns a bearer token for it.
async fn register_and_login(app: &Router, username: &str) -> String {
    let (status, _) = send(
        app,
        Method::POST,
        "/api/v1/auth/register",
        None,
        Some(json!({ "username": username, "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({ "username": username, "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["data"]["token"].as_str().unwrap().to_string()
}

/// Creates a category and a product; returns the product id.
async fn create_product(app: &Router, token: &str, name: &str, price: i64, stock: i64) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/categories",
        Some(token),
        Some(json!({ "name": format!("{} Category", name) })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let category_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/products",
        Some(token),
        Some(json!({
            "name": name,
            "price_cents": price,
            "stock": stock,
            "category_id": category_id,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["data"]["sku"].as_str().unwrap().starts_with("SKU-"));
    body["data"]["id"].as_str().unwrap().to_string()
}

fn sale(product_id: &str, quantity: i64, cash_cents: i64) -> Value {
    json!({
        "payment_method": "Cash",
        "cash_cents": cash_cents,
        "items": [{ "product_id": product_id, "quantity": quantity }],
    })
}

#[tokio::test]
async fn test_health_check() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["database"], "ok");
}

#[tokio::test]
async fn test_first_user_is_admin_then_cashier() {
    let app = app().await;

    let (_, first) = send(
        &app,
        Method::POST,
        "/api/v1/auth/register",
        None,
        Some(json!({ "username": "owner", "password": "password123" })),
    )
    .await;
    assert_eq!(first["data"]["role"], "admin");
    assert!(first["data"].get("password_hash").is_none());

    let (_, second) = send(
        &app,
        Method::POST,
        "/api/v1/auth/register",
        None,
        Some(json!({ "username": "kasir01", "password": "password123" })),
    )
    .await;
    assert_eq!(second["data"]["role"], "cashier");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/auth/register",
        None,
        Some(json!({ "username": "OWNER", "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn test_login_rejects_wrong_password() {
    let app = app().await;
    register_and_login(&app, "owner").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({ "username": "owner", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = app().await;

    let (status, _) = send(&app, Method::GET, "/api/v1/products", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::GET, "/api/v1/products", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_cashier_cannot_manage_catalogue() {
    let app = app().await;
    register_and_login(&app, "owner").await;
    let cashier = register_and_login(&app, "kasir01").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/categories",
        Some(&cashier),
        Some(json!({ "name": "Snacks" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_product_crud_and_paging() {
    let app = app().await;
    let admin = register_and_login(&app, "owner").await;
    let id = create_product(&app, &admin, "Coca-Cola", 500, 10).await;

    let (status, body) = send(&app, Method::GET, "/api/v1/products", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["page"], 1);
    assert_eq!(body["data"]["page_size"], 10);
    assert_eq!(body["data"]["total"], 1);

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/products/{}", id),
        Some(&admin),
        Some(json!({
            "name": "Coca-Cola 330ml",
            "price_cents": 650,
            "stock": 12,
            "category_id": body["data"]["items"][0]["category_id"],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["price_cents"], 650);

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/v1/products/{}", id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/products/{}", id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_invalid_product_is_rejected() {
    let app = app().await;
    let admin = register_and_login(&app, "owner").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/products",
        Some(&admin),
        Some(json!({
            "name": "Ab",
            "price_cents": 500,
            "stock": 1,
            "category_id": "c1",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_checkout_flow() {
    let app = app().await;
    let admin = register_and_login(&app, "owner").await;
    let cashier = register_and_login(&app, "kasir01").await;
    let product = create_product(&app, &admin, "Coca-Cola", 500, 10).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/transactions",
        Some(&cashier),
        Some(sale(&product, 3, 2000)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["total_amount_cents"], 1500);
    assert_eq!(body["data"]["change_cents"], 500);
    assert!(body["data"]["code"].as_str().unwrap().starts_with("INV-"));
    let sale_id = body["data"]["id"].as_str().unwrap().to_string();

    let (_, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/products/{}", product),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(body["data"]["stock"], 7);

    // History is for managers only
    let (status, _) = send(&app, Method::GET, "/api/v1/transactions", Some(&cashier), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, Method::GET, "/api/v1/transactions", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/transactions/{}", sale_id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"][0]["quantity"], 3);
    assert!(body["data"]["cashier_id"].is_string());

    // Sold products cannot be deleted
    let (status, body) = send(
        &app,
        Method::DELETE,
        &format!("/api/v1/products/{}", product),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn test_checkout_rejections() {
    let app = app().await;
    let admin = register_and_login(&app, "owner").await;
    let product = create_product(&app, &admin, "Peanuts", 500, 2).await;

    let cases = [
        (sale(&product, 5, 10_000), StatusCode::UNPROCESSABLE_ENTITY, "INSUFFICIENT_STOCK"),
        (sale(&product, 2, 500), StatusCode::PAYMENT_REQUIRED, "PAYMENT_INSUFFICIENT"),
        (sale("missing-product", 1, 500), StatusCode::NOT_FOUND, "NOT_FOUND"),
        (
            json!({ "payment_method": "Cash", "cash_cents": 100, "items": [] }),
            StatusCode::BAD_REQUEST,
            "EMPTY_BASKET",
        ),
        (
            json!({
                "payment_method": "Cash",
                "cash_cents": 10_000,
                "discount_cents": 5_000,
                "items": [{ "product_id": product, "quantity": 1 }],
            }),
            StatusCode::UNPROCESSABLE_ENTITY,
            "INVALID_DISCOUNT",
        ),
    ];

    for (body, status, code) in cases {
        let (actual, response) =
            send(&app, Method::POST, "/api/v1/transactions", Some(&admin), Some(body)).await;
        assert_eq!(actual, status, "{}", response);
        assert_eq!(response["code"], code);
    }

    let (_, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/products/{}", product),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(body["data"]["stock"], 2);

    let (_, body) = send(&app, Method::GET, "/api/v1/transactions", Some(&admin), None).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_transaction_is_not_found() {
    let app = app().await;
    let admin = register_and_login(&app, "owner").await;

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/v1/transactions/no-such-sale",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}
