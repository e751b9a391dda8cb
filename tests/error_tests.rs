// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::StatusCode;
use axum::response::IntoResponse;
use kakao_session_gateway::config::ConfigError;
use kakao_session_gateway::error::AppError;

async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_unauthorized_maps_to_401() {
    let (status, body) = render(AppError::Unauthorized).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
    assert!(body.get("details").is_none());
}

#[tokio::test]
async fn test_bad_request_carries_details() {
    let (status, body) = render(AppError::BadRequest("uuid: length".to_string())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "uuid: length");
}

#[tokio::test]
async fn test_internal_errors_hide_details() {
    for err in [
        AppError::KakaoApi("HTTP 503".to_string()),
        AppError::Database("connection reset".to_string()),
        AppError::TokenStore("READONLY".to_string()),
        AppError::Timeout("token store set".to_string()),
        AppError::Config(ConfigError::Missing("JWT_REFRESH_SECRET")),
        AppError::Internal(anyhow::anyhow!("signing failed")),
    ] {
        let (status, body) = render(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.get("details").is_none());
    }
}

#[test]
fn test_is_unauthorized() {
    assert!(AppError::Unauthorized.is_unauthorized());
    assert!(!AppError::BadRequest("x".to_string()).is_unauthorized());
}
