// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use kakao_session_gateway::config::Config;
use kakao_session_gateway::db::{
    DirectoryTransaction, MemoryTokenStore, MemoryUserDirectory, TokenStore, UserDirectory,
};
use kakao_session_gateway::error::{AppError, Result};
use kakao_session_gateway::models::{KakaoProfile, NewUser, User};
use kakao_session_gateway::routes::create_router;
use kakao_session_gateway::services::{IdentityProvider, Reconciler, SessionTokens};
use kakao_session_gateway::AppState;
use std::sync::Arc;

/// Check if a Redis server is available via environment variable.
#[allow(dead_code)]
pub fn redis_available() -> bool {
    std::env::var("REDIS_URL").is_ok()
}

/// Skip test with message if Redis is not available.
#[macro_export]
macro_rules! require_redis {
    () => {
        if !crate::common::redis_available() {
            eprintln!("⚠️  Skipping: REDIS_URL not set");
            return;
        }
    };
}

/// A Kakao profile with every optional attribute filled in.
#[allow(dead_code)]
pub fn kakao_profile(kakao_id: i64) -> KakaoProfile {
    KakaoProfile {
        kakao_id,
        email: Some(format!("user{}@example.com", kakao_id)),
        nickname: Some(format!("user{}", kakao_id)),
        profile_image_url: Some(format!("https://img.example.com/{}.jpg", kakao_id)),
        thumbnail_image_url: Some(format!("https://img.example.com/{}_t.jpg", kakao_id)),
    }
}

/// A user that exists only in memory, for token tests.
#[allow(dead_code)]
pub fn test_user(uuid: &str) -> User {
    User {
        id: 1,
        uuid: uuid.to_string(),
        kakao_id: Some(12345),
        email: None,
        nickname: Some("tester".to_string()),
        profile_image_url: None,
        thumbnail_image_url: None,
        created_at: "2026-01-01T00:00:00Z".parse().unwrap(),
    }
}

#[allow(dead_code)]
pub fn test_tokens() -> SessionTokens {
    SessionTokens::new(&Config::test_default().tokens)
}

/// Identity provider that maps authorization codes to canned profiles.
///
/// Codes of the form `code-<kakao_id>` succeed; anything else is rejected
/// the way Kakao rejects a bad code.
#[allow(dead_code)]
pub struct FakeIdentityProvider;

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    async fn fetch_profile(&self, code: &str) -> Result<KakaoProfile> {
        code.strip_prefix("code-")
            .and_then(|id| id.parse().ok())
            .map(kakao_profile)
            .ok_or_else(|| AppError::BadRequest("Kakao rejected request (HTTP 400)".to_string()))
    }
}

/// Token store whose writes always fail.
#[allow(dead_code)]
#[derive(Default)]
pub struct FailingTokenStore;

#[async_trait]
impl TokenStore for FailingTokenStore {
    async fn get(&self, _uuid: &str) -> Result<Option<String>> {
        Ok(None)
    }

    async fn set(&self, _uuid: &str, _token: &str) -> Result<()> {
        Err(AppError::TokenStore("connection refused".to_string()))
    }

    async fn delete(&self, _uuid: &str) -> Result<()> {
        Ok(())
    }
}

/// Directory whose transactions fail at commit time.
#[allow(dead_code)]
#[derive(Clone, Default)]
pub struct FailingCommitDirectory {
    pub inner: MemoryUserDirectory,
}

#[async_trait]
impl UserDirectory for FailingCommitDirectory {
    async fn find_by_uuid(&self, uuid: &str) -> Result<Option<User>> {
        self.inner.find_by_uuid(uuid).await
    }

    async fn begin(&self) -> Result<Box<dyn DirectoryTransaction>> {
        Ok(Box::new(FailingCommitTransaction {
            inner: self.inner.begin().await?,
        }))
    }
}

struct FailingCommitTransaction {
    inner: Box<dyn DirectoryTransaction>,
}

#[async_trait]
impl DirectoryTransaction for FailingCommitTransaction {
    async fn find_by_kakao_id(&mut self, kakao_id: i64) -> Result<Option<User>> {
        self.inner.find_by_kakao_id(kakao_id).await
    }

    async fn insert(&mut self, user: NewUser) -> Result<User> {
        self.inner.insert(user).await
    }

    async fn commit(&mut self) -> Result<()> {
        self.inner.rollback().await?;
        Err(AppError::Database("deadlock detected".to_string()))
    }

    async fn rollback(&mut self) -> Result<()> {
        self.inner.rollback().await
    }
}

/// In-memory collaborators wired into a reconciler.
#[allow(dead_code)]
pub struct TestHarness {
    pub directory: MemoryUserDirectory,
    pub store: MemoryTokenStore,
    pub reconciler: Reconciler,
}

#[allow(dead_code)]
pub fn test_harness() -> TestHarness {
    let directory = MemoryUserDirectory::new();
    let store = MemoryTokenStore::new();
    let reconciler = Reconciler::new(
        Arc::new(directory.clone()),
        Arc::new(store.clone()),
        test_tokens(),
    );

    TestHarness {
        directory,
        store,
        reconciler,
    }
}

/// Create a test app with in-memory dependencies.
/// Returns the router and the harness backing it.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, TestHarness) {
    let harness = test_harness();
    let state = Arc::new(AppState {
        config: Config::test_default(),
        reconciler: harness.reconciler.clone(),
        identity_provider: Arc::new(FakeIdentityProvider),
    });

    (create_router(state), harness)
}
