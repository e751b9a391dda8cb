// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! SQL-backed user directory.
//!
//! Runs over `sqlx::Any` so the same queries serve MySQL in production and
//! SQLite in tests. Every call is bounded by the configured timeout.

use super::{DirectoryTransaction, UserDirectory};
use crate::error::{with_timeout, AppError, Result};
use crate::models::{NewUser, User};
use crate::time_utils::{format_utc_rfc3339, parse_utc_rfc3339};
use async_trait::async_trait;
use sqlx::any::{AnyPoolOptions, AnyRow};
use sqlx::{Any, AnyPool, Row, Transaction};
use std::time::Duration;

const MAX_CONNECTIONS: u32 = 10;

fn db_err(e: sqlx::Error) -> AppError {
    AppError::Database(e.to_string())
}

fn user_from_row(row: &AnyRow) -> std::result::Result<User, sqlx::Error> {
    let created_at: String = row.try_get("created_at")?;
    Ok(User {
        id: row.try_get("id")?,
        uuid: row.try_get("uuid")?,
        kakao_id: row.try_get("kakao_id")?,
        email: row.try_get("kakao_email")?,
        nickname: row.try_get("kakao_nickname")?,
        profile_image_url: row.try_get("kakao_profile_img_url")?,
        thumbnail_image_url: row.try_get("kakao_thumbnail_img_url")?,
        created_at: parse_utc_rfc3339(&created_at)
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
    })
}

/// User directory over a SQL connection pool.
#[derive(Clone)]
pub struct SqlUserDirectory {
    pool: AnyPool,
    timeout: Duration,
}

impl SqlUserDirectory {
    /// Connect to the directory at `database_url`.
    pub async fn connect(database_url: &str, timeout: Duration) -> Result<Self> {
        sqlx::any::install_default_drivers();

        let pool = AnyPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(timeout)
            .connect(database_url)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to directory: {}", e)))?;

        tracing::info!("Connected to user directory");
        Ok(Self::new(pool, timeout))
    }

    /// Wrap an existing pool.
    pub fn new(pool: AnyPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }
}

#[async_trait]
impl UserDirectory for SqlUserDirectory {
    async fn find_by_uuid(&self, uuid: &str) -> Result<Option<User>> {
        let row = with_timeout(
            self.timeout,
            "find user by uuid",
            sqlx::query(
                r#"
                SELECT id, uuid, kakao_id, kakao_email, kakao_nickname,
                       kakao_profile_img_url, kakao_thumbnail_img_url, created_at
                FROM `user`
                WHERE uuid = ?
                "#,
            )
            .bind(uuid)
            .fetch_optional(&self.pool),
            db_err,
        )
        .await?;

        row.as_ref().map(user_from_row).transpose().map_err(db_err)
    }

    async fn begin(&self) -> Result<Box<dyn DirectoryTransaction>> {
        let tx = with_timeout(self.timeout, "begin transaction", self.pool.begin(), db_err).await?;
        Ok(Box::new(SqlTransaction {
            tx: Some(tx),
            timeout: self.timeout,
        }))
    }
}

struct SqlTransaction {
    tx: Option<Transaction<'static, Any>>,
    timeout: Duration,
}

impl SqlTransaction {
    fn open(&mut self) -> Result<&mut Transaction<'static, Any>> {
        self.tx
            .as_mut()
            .ok_or_else(|| AppError::Database("Transaction already finished".to_string()))
    }
}

#[async_trait]
impl DirectoryTransaction for SqlTransaction {
    async fn find_by_kakao_id(&mut self, kakao_id: i64) -> Result<Option<User>> {
        let timeout = self.timeout;
        let tx = self.open()?;

        let row = with_timeout(
            timeout,
            "find user by kakao_id",
            sqlx::query(
                r#"
                SELECT id, uuid, kakao_id, kakao_email, kakao_nickname,
                       kakao_profile_img_url, kakao_thumbnail_img_url, created_at
                FROM `user`
                WHERE kakao_id = ?
                "#,
            )
            .bind(kakao_id)
            .fetch_optional(&mut **tx),
            db_err,
        )
        .await?;

        row.as_ref().map(user_from_row).transpose().map_err(db_err)
    }

    async fn insert(&mut self, user: NewUser) -> Result<User> {
        let timeout = self.timeout;
        let tx = self.open()?;
        let created_at = format_utc_rfc3339(user.created_at);

        let result = with_timeout(
            timeout,
            "insert user",
            sqlx::query(
                r#"
                INSERT INTO `user` (uuid, kakao_id, kakao_email, kakao_nickname,
                                    kakao_profile_img_url, kakao_thumbnail_img_url, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(user.uuid.as_str())
            .bind(user.kakao_id)
            .bind(user.email.as_deref())
            .bind(user.nickname.as_deref())
            .bind(user.profile_image_url.as_deref())
            .bind(user.thumbnail_image_url.as_deref())
            .bind(created_at.as_str())
            .execute(&mut **tx),
            db_err,
        )
        .await?;

        let id = result
            .last_insert_id()
            .ok_or_else(|| AppError::Database("Insert did not report a row id".to_string()))?;

        Ok(user.into_user(id))
    }

    async fn commit(&mut self) -> Result<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| AppError::Database("Transaction already finished".to_string()))?;
        with_timeout(self.timeout, "commit transaction", tx.commit(), db_err).await
    }

    async fn rollback(&mut self) -> Result<()> {
        match self.tx.take() {
            Some(tx) => {
                with_timeout(self.timeout, "rollback transaction", tx.rollback(), db_err).await
            }
            None => Ok(()),
        }
    }
}
