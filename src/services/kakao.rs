// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Kakao OAuth client.
//!
//! Exchanges an authorization code for a Kakao access token, then fetches
//! the user's profile with it.

use crate::error::{AppError, Result};
use crate::models::KakaoProfile;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

const KAKAO_TOKEN_URL: &str = "https://kauth.kakao.com/oauth/token";
const KAKAO_USER_URL: &str = "https://kapi.kakao.com/v2/user/me";

/// External identity provider that turns an authorization code into a profile.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn fetch_profile(&self, code: &str) -> Result<KakaoProfile>;
}

/// Kakao REST API client.
#[derive(Clone)]
pub struct KakaoClient {
    http: reqwest::Client,
    token_url: String,
    user_url: String,
    client_id: String,
    redirect_uri: String,
}

impl KakaoClient {
    /// Create a client; every request is bounded by `timeout`.
    pub fn new(client_id: String, redirect_uri: String, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HTTP client init failed: {}", e)))?;

        Ok(Self {
            http,
            token_url: KAKAO_TOKEN_URL.to_string(),
            user_url: KAKAO_USER_URL.to_string(),
            client_id,
            redirect_uri,
        })
    }

    /// Point the client at different endpoints (local stubs, staging).
    pub fn with_endpoints(
        mut self,
        token_url: impl Into<String>,
        user_url: impl Into<String>,
    ) -> Self {
        self.token_url = token_url.into();
        self.user_url = user_url.into();
        self
    }

    /// Exchange an authorization code for a Kakao access token.
    pub async fn exchange_code(&self, code: &str) -> Result<KakaoTokenResponse> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("grant_type", "authorization_code"),
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("code", code),
            ])
            .send()
            .await
            .map_err(|e| request_err("Token exchange", e))?;

        let token: KakaoTokenResponse = self.check_response_json(response).await?;
        if token.access_token.is_empty() {
            return Err(AppError::BadRequest(
                "Kakao token response has no access token".to_string(),
            ));
        }
        Ok(token)
    }

    /// Get the profile of the user owning `access_token`.
    pub async fn get_user(&self, access_token: &str) -> Result<KakaoUserResponse> {
        let response = self
            .http
            .get(&self.user_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| request_err("Profile request", e))?;

        self.check_response_json(response).await
    }

    /// Check response status and parse the JSON body.
    ///
    /// Client errors mean Kakao rejected what we forwarded (usually a bad or
    /// reused authorization code) and surface as 400; everything else is an
    /// upstream failure.
    async fn check_response_json<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| request_err("Reading response", e))?;

        // Kakao answers a bad or reused authorization code with a 4xx.
        if status.is_client_error() {
            tracing::warn!(status = status.as_u16(), "Kakao rejected request");
            return Err(AppError::BadRequest(format!(
                "Kakao rejected request (HTTP {})",
                status.as_u16()
            )));
        }
        if !status.is_success() {
            return Err(AppError::KakaoApi(format!("HTTP {}: {}", status, body)));
        }

        serde_json::from_str(&body)
            .map_err(|e| AppError::BadRequest(format!("Malformed Kakao response: {}", e)))
    }
}

fn request_err(what: &str, e: reqwest::Error) -> AppError {
    if e.is_timeout() {
        AppError::Timeout(format!("Kakao {}", what.to_lowercase()))
    } else {
        AppError::KakaoApi(format!("{} failed: {}", what, e))
    }
}

#[async_trait]
impl IdentityProvider for KakaoClient {
    async fn fetch_profile(&self, code: &str) -> Result<KakaoProfile> {
        let token = self.exchange_code(code).await?;
        let user = self.get_user(&token.access_token).await?;
        user.into_profile()
    }
}

/// Token response from `kauth.kakao.com/oauth/token`.
#[derive(Debug, Clone, Deserialize)]
pub struct KakaoTokenResponse {
    #[serde(default)]
    pub access_token: String,
    pub token_type: Option<String>,
    pub expires_in: Option<i64>,
}

/// Response from `kapi.kakao.com/v2/user/me`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KakaoUserResponse {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub properties: Option<KakaoProperties>,
    #[serde(default)]
    pub kakao_account: Option<KakaoAccount>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct KakaoProperties {
    pub nickname: Option<String>,
    pub profile_image: Option<String>,
    pub thumbnail_image: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct KakaoAccount {
    pub email: Option<String>,
}

impl KakaoUserResponse {
    /// Convert into a profile; a missing or zero ID is a bad request.
    pub fn into_profile(self) -> Result<KakaoProfile> {
        let kakao_id = match self.id {
            Some(id) if id != 0 => id,
            _ => {
                return Err(AppError::BadRequest(
                    "Kakao profile has no user id".to_string(),
                ))
            }
        };
        let properties = self.properties.unwrap_or_default();

        Ok(KakaoProfile {
            kakao_id,
            email: self.kakao_account.and_then(|a| a.email),
            nickname: properties.nickname,
            profile_image_url: properties.profile_image,
            thumbnail_image_url: properties.thumbnail_image,
        })
    }
}
