// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Redis-backed refresh token store.

use super::TokenStore;
use crate::error::{with_timeout, AppError, Result};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;

fn store_err(e: redis::RedisError) -> AppError {
    AppError::TokenStore(e.to_string())
}

/// Refresh tokens keyed by user UUID, stored without expiry.
#[derive(Clone)]
pub struct RedisTokenStore {
    conn: ConnectionManager,
    timeout: Duration,
}

impl RedisTokenStore {
    /// Connect to Redis at `url` (e.g. `redis://127.0.0.1:6379`).
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self> {
        let client = redis::Client::open(url).map_err(store_err)?;
        let conn = with_timeout(
            timeout,
            "connect token store",
            ConnectionManager::new(client),
            store_err,
        )
        .await?;

        tracing::info!("Connected to token store");
        Ok(Self { conn, timeout })
    }
}

#[async_trait]
impl TokenStore for RedisTokenStore {
    async fn get(&self, uuid: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        with_timeout(
            self.timeout,
            "token store get",
            conn.get::<_, Option<String>>(uuid),
            store_err,
        )
        .await
    }

    async fn set(&self, uuid: &str, token: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        with_timeout(
            self.timeout,
            "token store set",
            conn.set::<_, _, ()>(uuid, token),
            store_err,
        )
        .await?;

        tracing::info!(uuid = %uuid, "Refresh token saved");
        Ok(())
    }

    async fn delete(&self, uuid: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let removed: i64 = with_timeout(
            self.timeout,
            "token store delete",
            conn.del::<_, i64>(uuid),
            store_err,
        )
        .await?;

        tracing::info!(uuid = %uuid, removed, "Refresh token deleted");
        Ok(())
    }
}
