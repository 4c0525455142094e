//! `HttpBackend` against a stub backend served by axum.

use std::net::SocketAddr;

use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use scanpos_client::{BackendConfig, ClientError, HttpBackend, ProductCatalog, TradeGateway};
use scanpos_core::{Product, TradeCreateRequest, TradeLineRequest, TradeResponse};
use serde_json::json;

const EAN: &str = "4901234567894";

fn tea() -> Product {
    Product {
        prd_id: 1,
        code: EAN.to_string(),
        name: "Green Tea".to_string(),
        price: 150,
        tax_cd: "8".to_string(),
    }
}

async fn product(Path(code): Path<String>) -> Response {
    if code == EAN {
        Json(tea()).into_response()
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "product_not_found", "message": "not registered", "code": code })),
        )
            .into_response()
    }
}

async fn trade(Json(request): Json<TradeCreateRequest>) -> Response {
    if request.trade_lines.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "validation_error",
                "message": "trade_lines must not be empty",
                "details": [{ "field": "trade_lines" }]
            })),
        )
            .into_response();
    }
    if request.emp_cd == "CRASH" {
        return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
    }
    if request.emp_cd == "E002" {
        // Backends without timezone support send a naive timestamp.
        return Json(json!({
            "trade_id": 43,
            "total_amt": 162,
            "tax_amt": 12,
            "created_at": "2024-05-01T09:30:00.123456"
        }))
        .into_response();
    }

    Json(json!({
        "trade_id": 42,
        "total_amt": 324,
        "tax_amt": 24,
        "created_at": "2024-05-01T09:30:00Z"
    }))
    .into_response()
}

async fn serve() -> SocketAddr {
    let app = Router::new()
        .route("/api/v1/products/{code}", get(product))
        .route("/api/v1/trades", post(trade));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn backend(addr: SocketAddr) -> HttpBackend {
    HttpBackend::new(&BackendConfig::new(format!("http://{addr}"))).unwrap()
}

fn request(emp_cd: &str, lines: Vec<TradeLineRequest>) -> TradeCreateRequest {
    TradeCreateRequest {
        emp_cd: emp_cd.to_string(),
        store_cd: "S001".to_string(),
        pos_no: "P01".to_string(),
        trade_lines: lines,
    }
}

#[tokio::test]
async fn test_lookup_found() {
    let backend = backend(serve().await);
    assert_eq!(backend.get_product_by_code(EAN).await.unwrap(), tea());
}

#[tokio::test]
async fn test_lookup_404_is_unregistered_product() {
    let backend = backend(serve().await);
    let err = backend.get_product_by_code("4900000000000").await.unwrap_err();
    match err {
        ClientError::ProductNotFound { code } => assert_eq!(code, "4900000000000"),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_code_never_reaches_backend() {
    let backend = backend(serve().await);
    let err = backend.get_product_by_code("12ab").await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidProductCode(_)));
}

#[tokio::test]
async fn test_create_trade() {
    let backend = backend(serve().await);
    let trade: TradeResponse = backend
        .create_trade(&request("E001", vec![TradeLineRequest { prd_id: 1, qty: 2 }]))
        .await
        .unwrap();
    assert_eq!(trade.trade_id, 42);
    assert_eq!(trade.total_amt, 324);
    assert_eq!(trade.tax_amt, 24);
}

#[tokio::test]
async fn test_create_trade_with_naive_timestamp() {
    let backend = backend(serve().await);
    let trade = backend
        .create_trade(&request("E002", vec![TradeLineRequest { prd_id: 1, qty: 1 }]))
        .await
        .unwrap();
    assert_eq!(trade.trade_id, 43);
    assert_eq!(trade.created_at.to_rfc3339(), "2024-05-01T09:30:00.123456+00:00");
}

#[tokio::test]
async fn test_trade_validation_error_keeps_details() {
    let backend = backend(serve().await);
    let err = backend.create_trade(&request("E001", vec![])).await.unwrap_err();
    match err {
        ClientError::Rejected {
            status,
            error,
            details,
            ..
        } => {
            assert_eq!(status, 400);
            assert_eq!(error, "validation_error");
            assert!(details.is_some());
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_is_retryable() {
    let backend = backend(serve().await);
    let err = backend
        .create_trade(&request("CRASH", vec![TradeLineRequest { prd_id: 1, qty: 1 }]))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Rejected { status: 500, .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_connection_refused() {
    let addr = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let err = backend(addr).get_product_by_code(EAN).await.unwrap_err();
    assert!(matches!(err, ClientError::ConnectionFailed(_)));
    assert!(err.is_retryable());
}

#[test]
fn test_invalid_scheme_rejected_at_construction() {
    let err = HttpBackend::new(&BackendConfig::new("ftp://example.com")).err().unwrap();
    assert!(matches!(err, ClientError::InvalidUrl(_)));
}
