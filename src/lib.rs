// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Kakao session gateway: exchanges Kakao OAuth codes for local users and
//! manages their access/refresh session tokens.
//!
//! Refresh tokens are kept in a key-value token store (one per user) and
//! users live in a relational directory.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use services::{IdentityProvider, Reconciler};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub reconciler: Reconciler,
    pub identity_provider: Arc<dyn IdentityProvider>,
}
