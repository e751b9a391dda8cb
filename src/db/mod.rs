//! Storage layer: the relational user directory and the refresh-token store.
//!
//! Both are reached through traits so the reconciler can be wired to real
//! backends in production and to in-memory fakes in tests.

pub mod memory;
pub mod redis_store;
pub mod sql;

pub use memory::{MemoryTokenStore, MemoryUserDirectory};
pub use redis_store::RedisTokenStore;
pub use sql::SqlUserDirectory;

use crate::error::Result;
use crate::models::{NewUser, User};
use async_trait::async_trait;

/// Relational lookup of users by internal or Kakao identity.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Get a user by internal identity.
    async fn find_by_uuid(&self, uuid: &str) -> Result<Option<User>>;

    /// Start an atomic unit of work.
    async fn begin(&self) -> Result<Box<dyn DirectoryTransaction>>;
}

/// Writes made through a transaction become visible only after `commit`.
///
/// Dropping a transaction without committing discards its writes.
#[async_trait]
pub trait DirectoryTransaction: Send {
    async fn find_by_kakao_id(&mut self, kakao_id: i64) -> Result<Option<User>>;

    async fn insert(&mut self, user: NewUser) -> Result<User>;

    async fn commit(&mut self) -> Result<()>;

    async fn rollback(&mut self) -> Result<()>;
}

/// Key-value mapping from internal identity to the current refresh token.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn get(&self, uuid: &str) -> Result<Option<String>>;

    /// Store `token` for `uuid`, replacing any previous token. No expiry.
    async fn set(&self, uuid: &str, token: &str) -> Result<()>;

    /// Remove the token for `uuid`. Removing an absent key is not an error.
    async fn delete(&self, uuid: &str) -> Result<()>;
}
