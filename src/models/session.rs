// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session payloads returned by the auth endpoints.

use super::User;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Signed access/refresh token pair.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "bindings/")
)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

// Tokens are credentials; keep them out of Debug output and therefore logs.
impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// User's public attributes plus a freshly issued token pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "bindings/")
)]
pub struct SessionPayload {
    pub uuid: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub external_id: Option<i64>,
    pub email: Option<String>,
    pub nickname: Option<String>,
    pub avatar_url: Option<String>,
    pub thumbnail_url: Option<String>,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
    pub token: TokenPair,
}

impl SessionPayload {
    pub fn new(user: &User, token: TokenPair) -> Self {
        Self {
            uuid: user.uuid.clone(),
            external_id: user.kakao_id,
            email: user.email.clone(),
            nickname: user.nickname.clone(),
            avatar_url: user.profile_image_url.clone(),
            thumbnail_url: user.thumbnail_image_url.clone(),
            created_at: user.created_at,
            token,
        }
    }
}
