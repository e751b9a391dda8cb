// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP tests for the auth routes.
//!
//! These verify that:
//! 1. Login and auto-login return 201 with a session payload
//! 2. Missing or bad credentials map to 401
//! 3. Malformed request bodies and Kakao rejections map to 400

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use chrono::{Duration, Utc};
use kakao_session_gateway::db::{TokenStore, UserDirectory};
use kakao_session_gateway::models::SessionPayload;
use tower::ServiceExt;

mod common;
use common::{create_test_app, test_tokens};

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn kakao_login_request(code: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri("/auth/kakao")
        .header(header::AUTHORIZATION, format!("Bearer {}", code))
        .body(Body::empty())
        .unwrap()
}

fn auto_login_request(access: &str, refresh: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/auth/auto-login")
        .header(header::AUTHORIZATION, format!("Bearer {}", access))
        .header("X-Refresh-Token", refresh)
        .body(Body::empty())
        .unwrap()
}

fn logout_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/auth/logout")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_ping() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(Request::builder().uri("/ping").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = body_json(response).await;
    assert_eq!(body["message"], "pong");
}

#[tokio::test]
async fn test_kakao_login_created() {
    let (app, harness) = create_test_app();

    let response = app.oneshot(kakao_login_request("code-12345")).await.unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload: SessionPayload = body_json(response).await;
    assert_eq!(payload.external_id, Some(12345));
    assert_eq!(
        harness.store.get(&payload.uuid).await.unwrap().as_deref(),
        Some(payload.token.refresh_token.as_str())
    );
}

#[tokio::test]
async fn test_kakao_login_payload_field_names() {
    let (app, _) = create_test_app();

    let response = app.oneshot(kakao_login_request("code-42")).await.unwrap();
    let body: serde_json::Value = body_json(response).await;

    for field in [
        "uuid",
        "externalId",
        "email",
        "nickname",
        "avatarUrl",
        "thumbnailUrl",
        "createdAt",
    ] {
        assert!(body.get(field).is_some(), "missing field {}", field);
    }
    assert!(body["token"]["accessToken"].is_string());
    assert!(body["token"]["refreshToken"].is_string());
}

#[tokio::test]
async fn test_kakao_login_without_bearer() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/auth/kakao")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_kakao_login_rejected_code() {
    let (app, harness) = create_test_app();

    let response = app.oneshot(kakao_login_request("expired")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(harness.directory.users().await.is_empty());
}

#[tokio::test]
async fn test_auto_login_created() {
    let (app, harness) = create_test_app();
    let login = harness
        .reconciler
        .reconcile(&common::kakao_profile(1))
        .await
        .unwrap();

    let response = app
        .oneshot(auto_login_request(
            &login.token.access_token,
            &login.token.refresh_token,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload: SessionPayload = body_json(response).await;
    assert_eq!(payload.uuid, login.uuid);
}

#[tokio::test]
async fn test_auto_login_without_refresh_header() {
    let (app, harness) = create_test_app();
    let login = harness
        .reconciler
        .reconcile(&common::kakao_profile(2))
        .await
        .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/auto-login")
                .header(
                    header::AUTHORIZATION,
                    format!("Bearer {}", login.token.access_token),
                )
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auto_login_exhausted_pair() {
    let (app, harness) = create_test_app();
    let login = harness
        .reconciler
        .reconcile(&common::kakao_profile(3))
        .await
        .unwrap();
    let user = harness
        .directory
        .find_by_uuid(&login.uuid)
        .await
        .unwrap()
        .unwrap();
    let expired = test_tokens()
        .issue_at(&user, Utc::now() - Duration::days(30))
        .unwrap();

    let response = app
        .oneshot(auto_login_request(
            &expired.access_token,
            &expired.refresh_token,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = body_json(response).await;
    assert_eq!(body["error"], "unauthorized");
    assert!(harness.store.get(&login.uuid).await.unwrap().is_none());
}

#[tokio::test]
async fn test_logout_created() {
    let (app, harness) = create_test_app();
    let login = harness
        .reconciler
        .reconcile(&common::kakao_profile(4))
        .await
        .unwrap();

    let response = app
        .oneshot(logout_request(&format!(r#"{{"uuid": "{}"}}"#, login.uuid)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: serde_json::Value = body_json(response).await;
    assert_eq!(body, serde_json::json!({}));
    assert!(harness.store.get(&login.uuid).await.unwrap().is_none());
}

#[tokio::test]
async fn test_logout_unknown_uuid_is_ok() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(logout_request(r#"{"uuid": "abc-uuid"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_logout_bad_body() {
    for body in ["", "{}", r#"{"uuid": ""}"#, "not json"] {
        let (app, _) = create_test_app();

        let response = app.oneshot(logout_request(body)).await.unwrap();

        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "body {:?}",
            body
        );
    }
}
