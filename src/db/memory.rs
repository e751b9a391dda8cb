// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory directory and token store for tests and local development.

use super::{DirectoryTransaction, TokenStore, UserDirectory};
use crate::error::{AppError, Result};
use crate::models::{NewUser, User};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Token store backed by a shared `DashMap`.
#[derive(Clone, Default)]
pub struct MemoryTokenStore {
    entries: Arc<DashMap<String, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get(&self, uuid: &str) -> Result<Option<String>> {
        Ok(self.entries.get(uuid).map(|entry| entry.value().clone()))
    }

    async fn set(&self, uuid: &str, token: &str) -> Result<()> {
        self.entries.insert(uuid.to_string(), token.to_string());
        Ok(())
    }

    async fn delete(&self, uuid: &str) -> Result<()> {
        self.entries.remove(uuid);
        Ok(())
    }
}

#[derive(Default)]
struct Users {
    rows: Vec<User>,
    last_id: i64,
}

/// User directory held in memory, with commit-on-success transactions.
#[derive(Clone, Default)]
pub struct MemoryUserDirectory {
    users: Arc<Mutex<Users>>,
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all committed users.
    pub async fn users(&self) -> Vec<User> {
        self.users.lock().await.rows.clone()
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn find_by_uuid(&self, uuid: &str) -> Result<Option<User>> {
        let users = self.users.lock().await;
        Ok(users.rows.iter().find(|u| u.uuid == uuid).cloned())
    }

    async fn begin(&self) -> Result<Box<dyn DirectoryTransaction>> {
        Ok(Box::new(MemoryTransaction {
            users: self.users.clone(),
            staged: Vec::new(),
            finished: false,
        }))
    }
}

struct MemoryTransaction {
    users: Arc<Mutex<Users>>,
    staged: Vec<User>,
    finished: bool,
}

impl MemoryTransaction {
    fn ensure_open(&self) -> Result<()> {
        if self.finished {
            return Err(AppError::Database("Transaction already finished".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DirectoryTransaction for MemoryTransaction {
    async fn find_by_kakao_id(&mut self, kakao_id: i64) -> Result<Option<User>> {
        self.ensure_open()?;
        if let Some(user) = self.staged.iter().find(|u| u.kakao_id == Some(kakao_id)) {
            return Ok(Some(user.clone()));
        }
        let users = self.users.lock().await;
        Ok(users
            .rows
            .iter()
            .find(|u| u.kakao_id == Some(kakao_id))
            .cloned())
    }

    async fn insert(&mut self, user: NewUser) -> Result<User> {
        self.ensure_open()?;
        // Row IDs are consumed even if the transaction later rolls back.
        let id = {
            let mut users = self.users.lock().await;
            users.last_id += 1;
            users.last_id
        };
        let user = user.into_user(id);
        self.staged.push(user.clone());
        Ok(user)
    }

    async fn commit(&mut self) -> Result<()> {
        self.ensure_open()?;
        let mut users = self.users.lock().await;
        for staged in &self.staged {
            let conflict = users.rows.iter().any(|u| {
                u.uuid == staged.uuid || (u.kakao_id.is_some() && u.kakao_id == staged.kakao_id)
            });
            if conflict {
                return Err(AppError::Database(format!(
                    "Unique constraint violated for user {}",
                    staged.uuid
                )));
            }
        }
        users.rows.append(&mut self.staged);
        self.finished = true;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.staged.clear();
        self.finished = true;
        Ok(())
    }
}
