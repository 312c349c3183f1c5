// tests/api.rs
//
// Testes do router sem banco: o pool é preguiçoso e nenhuma destas rotas
// chega a abrir conexão.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

mod common;

use common::test_config;
use marketplace::config::AppState;
use marketplace::routes::build_router;

fn app() -> Router {
    let config = test_config();
    let pool = PgPoolOptions::new()
        .connect_lazy(&config.database_url)
        .expect("URL de banco válida");
    let state = AppState::from_pool(pool, config).expect("estado da aplicação");
    build_router(state)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.expect("corpo").to_bytes();
    serde_json::from_slice(&bytes).expect("JSON")
}

#[tokio::test]
async fn health_check_responds_ok() {
    let response = app()
        .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"OK");
}

#[tokio::test]
async fn protected_route_without_token_is_unauthorized() {
    let response = app()
        .oneshot(Request::get("/api/users/me").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "Missing or invalid authentication token.");
}

#[tokio::test]
async fn error_messages_follow_accept_language() {
    let response = app()
        .oneshot(
            Request::get("/api/offers")
                .header(header::ACCEPT_LANGUAGE, "pt-BR,pt;q=0.9")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Token de autenticação inválido ou ausente.");
}

#[tokio::test]
async fn tenant_and_admin_routes_require_authentication() {
    for uri in ["/api/tenants/products", "/api/admin/users"] {
        let response = app()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
    }
}

#[tokio::test]
async fn stripe_webhook_rejects_bad_signature() {
    let now = chrono::Utc::now().timestamp();
    let response = app()
        .oneshot(
            Request::post("/api/billing/webhooks/stripe")
                .header("stripe-signature", format!("t={now},v1=deadbeef"))
                .body(Body::from(r#"{"type":"payment_intent.succeeded"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn stripe_webhook_without_signature_header_is_rejected() {
    let response = app()
        .oneshot(
            Request::post("/api/billing/webhooks/stripe")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn razorpay_webhook_without_secret_is_unavailable() {
    let response = app()
        .oneshot(
            Request::post("/api/billing/webhooks/razorpay")
                .header("x-razorpay-signature", "00")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn fx_convert_validates_currency_codes() {
    let response = app()
        .oneshot(
            Request::post("/api/fx/convert")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"amount":100.0,"from":"dollars","to":"BRL"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert!(json["details"]["from"].is_array());
}

#[tokio::test]
async fn fx_convert_rejects_amounts_the_ledger_cannot_store() {
    for (amount, message) in [
        ("1000000000000000", "O valor excede o máximo de 999999999999.99."),
        ("0.001", "O valor aceita no máximo 2 casas decimais."),
        ("-5", "O valor não pode ser negativo."),
    ] {
        let response = app()
            .oneshot(
                Request::post("/api/fx/convert")
                    .header(header::CONTENT_TYPE, "application/json")
                    .header(header::ACCEPT_LANGUAGE, "pt-BR")
                    .body(Body::from(format!(r#"{{"amount":{amount},"from":"USD","to":"BRL"}}"#)))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{amount}");
        let json = body_json(response).await;
        assert_eq!(json["details"]["amount"][0], message, "{amount}");
    }
}

#[tokio::test]
async fn register_validates_payload_before_touching_the_database() {
    let response = app()
        .oneshot(
            Request::post("/api/auth/register")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"email":"not-an-email","password":"123","displayName":"Ana"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["details"]["email"].is_array());
    assert!(json["details"]["password"].is_array());
}

#[tokio::test]
async fn openapi_document_is_served() {
    let response = app()
        .oneshot(Request::get("/api-docs/openapi.json").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["paths"]["/api/offers/{id}/respond"].is_object());
    assert!(json["components"]["securitySchemes"]["api_jwt"].is_object());
}
