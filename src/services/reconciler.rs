// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Login reconciliation: initial login, auto-login and logout.
//!
//! Handles:
//! - Find-or-create of the local user for a Kakao identity
//! - Token pair issuance and refresh token persistence
//! - Auto-login from an (access, refresh) pair, with pair-substitution checks
//! - Revocation of the stored refresh token

use crate::db::{DirectoryTransaction, TokenStore, UserDirectory};
use crate::error::{AppError, Result};
use crate::models::{KakaoProfile, NewUser, SessionPayload, TokenPair, User};
use crate::services::tokens::SessionTokens;
use crate::time_utils::now_utc_secs;
use std::sync::Arc;

/// Orchestrates the user directory, token store and token issuer.
#[derive(Clone)]
pub struct Reconciler {
    directory: Arc<dyn UserDirectory>,
    store: Arc<dyn TokenStore>,
    tokens: SessionTokens,
    /// Require the presented refresh token to be the stored one.
    strict_refresh_rotation: bool,
}

impl Reconciler {
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        store: Arc<dyn TokenStore>,
        tokens: SessionTokens,
    ) -> Self {
        Self {
            directory,
            store,
            tokens,
            strict_refresh_rotation: false,
        }
    }

    pub fn with_strict_refresh_rotation(mut self, enabled: bool) -> Self {
        self.strict_refresh_rotation = enabled;
        self
    }

    pub fn tokens(&self) -> &SessionTokens {
        &self.tokens
    }

    /// Log in a Kakao user, creating the local record on first login.
    ///
    /// The directory transaction commits only after the refresh token has
    /// been stored. If the commit itself fails, the stored token is removed
    /// again so it cannot outlive the user row it refers to.
    pub async fn reconcile(&self, profile: &KakaoProfile) -> Result<SessionPayload> {
        let mut tx = self.directory.begin().await?;

        let (user, token, created) = match self.resolve_and_issue(&mut *tx, profile).await {
            Ok(resolved) => resolved,
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(error = %rollback_err, "Directory rollback failed");
                }
                return Err(e);
            }
        };

        if let Err(e) = tx.commit().await {
            tracing::error!(
                uuid = %user.uuid,
                error = %e,
                "Directory commit failed after token store write"
            );
            if let Err(delete_err) = self.store.delete(&user.uuid).await {
                tracing::error!(
                    uuid = %user.uuid,
                    error = %delete_err,
                    "Failed to remove refresh token for uncommitted login"
                );
            }
            return Err(e);
        }

        if created {
            tracing::info!(
                uuid = %user.uuid,
                kakao_id = profile.kakao_id,
                "New Kakao user created"
            );
        }
        tracing::info!(uuid = %user.uuid, "Kakao user logged in");

        Ok(SessionPayload::new(&user, token))
    }

    async fn resolve_and_issue(
        &self,
        tx: &mut dyn DirectoryTransaction,
        profile: &KakaoProfile,
    ) -> Result<(User, TokenPair, bool)> {
        // Existing users keep their stored profile; it is not refreshed here.
        let (user, created) = match tx.find_by_kakao_id(profile.kakao_id).await? {
            Some(user) => (user, false),
            None => {
                let new_user = NewUser::from_profile(profile, now_utc_secs());
                (tx.insert(new_user).await?, true)
            }
        };

        let token = self.tokens.issue(&user)?;
        self.store.set(&user.uuid, &token.refresh_token).await?;

        Ok((user, token, created))
    }

    /// Re-establish a session from a previously issued token pair.
    ///
    /// Both tokens must name the same user. A live access token is trusted
    /// first, then a live refresh token. Otherwise the stored refresh token
    /// of the named user is revoked, whether the pair expired or failed
    /// verification. Unverified claims are only ever used to pick what to
    /// revoke.
    pub async fn auto_reconcile(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<SessionPayload> {
        let access = self.tokens.validate_access(access_token);
        let refresh = self.tokens.validate_refresh(refresh_token);

        let uuid = match (access.asserted_claims(), refresh.asserted_claims()) {
            (Some(a), Some(r)) if a.uuid == r.uuid => a.uuid.clone(),
            (a, r) => {
                tracing::warn!(
                    access_uuid = ?a.map(|c| c.uuid.as_str()),
                    refresh_uuid = ?r.map(|c| c.uuid.as_str()),
                    access_error = ?access.error(),
                    refresh_error = ?refresh.error(),
                    "Token pair mismatch"
                );
                return Err(AppError::Unauthorized);
            }
        };

        if access.is_valid() {
            tracing::info!(uuid = %uuid, "Valid access token");
        } else if refresh.is_valid() {
            if self.strict_refresh_rotation {
                let stored = self.store.get(&uuid).await?;
                if stored.as_deref() != Some(refresh_token) {
                    tracing::warn!(uuid = %uuid, "Superseded refresh token presented");
                    self.revoke(&uuid).await?;
                    return Err(AppError::Unauthorized);
                }
            }
            tracing::info!(uuid = %uuid, "Valid refresh token");
        } else {
            self.revoke(&uuid).await?;
            tracing::warn!(
                uuid = %uuid,
                access_error = ?access.error(),
                refresh_error = ?refresh.error(),
                "Token pair exhausted"
            );
            return Err(AppError::Unauthorized);
        }

        let Some(user) = self.directory.find_by_uuid(&uuid).await? else {
            tracing::warn!(uuid = %uuid, "Token pair names an unknown user");
            self.revoke(&uuid).await?;
            return Err(AppError::Unauthorized);
        };

        let token = self.tokens.issue(&user)?;
        self.store.set(&user.uuid, &token.refresh_token).await?;

        tracing::info!(uuid = %user.uuid, "User auto logged in");
        Ok(SessionPayload::new(&user, token))
    }

    /// Delete the stored refresh token for `uuid`. Idempotent.
    pub async fn revoke(&self, uuid: &str) -> Result<()> {
        self.store.delete(uuid).await?;
        tracing::info!(uuid = %uuid, "Session revoked");
        Ok(())
    }
}
