// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod kakao;
pub mod reconciler;
pub mod tokens;

pub use kakao::{IdentityProvider, KakaoClient};
pub use reconciler::Reconciler;
pub use tokens::{AccessClaims, RefreshClaims, SessionTokens, TokenError, Verified};
