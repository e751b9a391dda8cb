// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Kakao login, auto-login and logout routes.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::models::SessionPayload;
use crate::AppState;

/// Header carrying the refresh token on auto-login.
pub const REFRESH_TOKEN_HEADER: &str = "x-refresh-token";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/kakao", get(kakao_login))
        .route("/auth/auto-login", post(auto_login))
        .route("/auth/logout", post(logout))
}

/// Extract the credential from an `Authorization: Bearer ...` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Log in with a Kakao authorization code passed as the bearer credential.
async fn kakao_login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<SessionPayload>)> {
    let code = bearer_token(&headers).ok_or_else(|| {
        tracing::warn!("Kakao login without bearer authorization code");
        AppError::Unauthorized
    })?;

    let profile = state.identity_provider.fetch_profile(code).await?;
    let payload = state.reconciler.reconcile(&profile).await?;

    Ok((StatusCode::CREATED, Json(payload)))
}

/// Re-issue a session from an access token (bearer) and refresh token (header).
async fn auto_login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<SessionPayload>)> {
    let access_token = bearer_token(&headers).ok_or_else(|| {
        tracing::warn!("Auto-login without bearer access token");
        AppError::Unauthorized
    })?;

    let refresh_token = headers
        .get(REFRESH_TOKEN_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            tracing::warn!("Auto-login without refresh token header");
            AppError::Unauthorized
        })?;

    let payload = state
        .reconciler
        .auto_reconcile(access_token, refresh_token)
        .await?;

    Ok((StatusCode::CREATED, Json(payload)))
}

/// Logout request body.
#[derive(Debug, Deserialize, Validate)]
pub struct LogoutRequest {
    #[validate(length(min = 1, max = 64))]
    pub uuid: String,
}

/// Revoke the stored refresh token for a user.
async fn logout(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<LogoutRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let Json(request) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;
    request
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    state.reconciler.revoke(&request.uuid).await?;
    tracing::info!(uuid = %request.uuid, "User logged out");

    Ok((StatusCode::CREATED, Json(serde_json::json!({}))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(auth: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(auth).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_extracted() {
        let headers = headers_with("Bearer abc.def.ghi");
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn test_bearer_token_rejects_other_schemes() {
        assert_eq!(bearer_token(&headers_with("Basic dXNlcjpwYXNz")), None);
        assert_eq!(bearer_token(&headers_with("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_logout_request_validation() {
        let empty = LogoutRequest {
            uuid: String::new(),
        };
        assert!(empty.validate().is_err());

        let ok = LogoutRequest {
            uuid: "abc-uuid".to_string(),
        };
        assert!(ok.validate().is_ok());
    }
}
