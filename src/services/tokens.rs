// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session token issuance and validation.
//!
//! Access and refresh tokens are HS256 JWTs signed with independent
//! secrets. Validation verifies the signature first and only then looks at
//! expiry, so an expired token still yields its (authentic) claims. A token
//! whose signature fails still reports the identity it names, for
//! revocation only.

use crate::config::TokenSettings;
use crate::error::{AppError, Result};
use crate::models::{TokenPair, User};
use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Claims carried by a short-lived access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessClaims {
    /// User's internal identity
    #[serde(rename = "sub")]
    pub uuid: String,
    /// When the user record was created
    pub created_at: DateTime<Utc>,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Unique token ID
    pub jti: String,
}

/// Claims carried by a long-lived refresh token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshClaims {
    /// Directory row ID of the user
    pub id: i64,
    #[serde(rename = "sub")]
    pub uuid: String,
    pub created_at: DateTime<Utc>,
    pub iat: u64,
    pub exp: u64,
    pub jti: String,
}

/// Common view over access and refresh claims.
pub trait SessionClaims: DeserializeOwned {
    fn uuid(&self) -> &str;
    fn expires_at(&self) -> u64;
}

impl SessionClaims for AccessClaims {
    fn uuid(&self) -> &str {
        &self.uuid
    }

    fn expires_at(&self) -> u64 {
        self.exp
    }
}

impl SessionClaims for RefreshClaims {
    fn uuid(&self) -> &str {
        &self.uuid
    }

    fn expires_at(&self) -> u64 {
        self.exp
    }
}

/// Why a token failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,

    #[error("token signature invalid")]
    InvalidSignature,

    #[error("malformed token")]
    Malformed,
}

/// Outcome of validating a session token.
///
/// Authentic claims come from `Valid` and `Expired` only. `Invalid` may
/// carry the payload it failed to verify, which must never be trusted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verified<C> {
    Valid(C),
    /// Authentic, but past its expiry.
    Expired(C),
    Invalid {
        error: TokenError,
        unverified: Option<C>,
    },
}

impl<C> Verified<C> {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verified::Valid(_))
    }

    /// Authentic claims, whether or not the token has expired.
    pub fn claims(&self) -> Option<&C> {
        match self {
            Verified::Valid(claims) | Verified::Expired(claims) => Some(claims),
            Verified::Invalid { .. } => None,
        }
    }

    /// Whatever claims the token carries, authentic or not.
    pub fn asserted_claims(&self) -> Option<&C> {
        match self {
            Verified::Valid(claims) | Verified::Expired(claims) => Some(claims),
            Verified::Invalid { unverified, .. } => unverified.as_ref(),
        }
    }

    pub fn error(&self) -> Option<TokenError> {
        match self {
            Verified::Valid(_) => None,
            Verified::Expired(_) => Some(TokenError::Expired),
            Verified::Invalid { error, .. } => Some(*error),
        }
    }

    /// Collapse into a `Result`, dropping the claims of an expired token.
    pub fn into_result(self) -> std::result::Result<C, TokenError> {
        match self {
            Verified::Valid(claims) => Ok(claims),
            Verified::Expired(_) => Err(TokenError::Expired),
            Verified::Invalid { error, .. } => Err(error),
        }
    }
}

/// Issues and validates access/refresh token pairs.
#[derive(Clone)]
pub struct SessionTokens {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: TimeDelta,
    refresh_ttl: TimeDelta,
    validation: Validation,
    unverified: Validation,
}

impl SessionTokens {
    pub fn new(settings: &TokenSettings) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked by hand so expired tokens can still report claims.
        validation.validate_exp = false;
        validation.leeway = 0;

        let mut unverified = validation.clone();
        unverified.insecure_disable_signature_validation();

        Self {
            access_encoding: EncodingKey::from_secret(settings.access_secret()),
            access_decoding: DecodingKey::from_secret(settings.access_secret()),
            refresh_encoding: EncodingKey::from_secret(settings.refresh_secret()),
            refresh_decoding: DecodingKey::from_secret(settings.refresh_secret()),
            access_ttl: settings.access_ttl(),
            refresh_ttl: settings.refresh_ttl(),
            validation,
            unverified,
        }
    }

    /// Issue a fresh token pair for `user`.
    pub fn issue(&self, user: &User) -> Result<TokenPair> {
        self.issue_at(user, Utc::now())
    }

    /// Issue a token pair as if the current time were `now`.
    pub fn issue_at(&self, user: &User, now: DateTime<Utc>) -> Result<TokenPair> {
        let iat = unix_seconds(now);

        let access_claims = AccessClaims {
            uuid: user.uuid.clone(),
            created_at: user.created_at,
            iat,
            exp: expiry(now, self.access_ttl)?,
            jti: uuid::Uuid::new_v4().to_string(),
        };

        let refresh_claims = RefreshClaims {
            id: user.id,
            uuid: user.uuid.clone(),
            created_at: user.created_at,
            iat,
            exp: expiry(now, self.refresh_ttl)?,
            jti: uuid::Uuid::new_v4().to_string(),
        };

        let header = Header::new(Algorithm::HS256);
        let access_token = encode(&header, &access_claims, &self.access_encoding)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Access token signing failed: {}", e)))?;
        let refresh_token = encode(&header, &refresh_claims, &self.refresh_encoding).map_err(
            |e| AppError::Internal(anyhow::anyhow!("Refresh token signing failed: {}", e)),
        )?;

        tracing::debug!(uuid = %user.uuid, "Session tokens issued");

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    pub fn validate_access(&self, token: &str) -> Verified<AccessClaims> {
        self.verify(token, &self.access_decoding)
    }

    pub fn validate_refresh(&self, token: &str) -> Verified<RefreshClaims> {
        self.verify(token, &self.refresh_decoding)
    }

    fn verify<C: SessionClaims>(&self, token: &str, key: &DecodingKey) -> Verified<C> {
        let claims = match decode::<C>(token, key, &self.validation) {
            Ok(data) => data.claims,
            Err(err) => {
                return match err.kind() {
                    ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                        Verified::Invalid {
                            error: TokenError::InvalidSignature,
                            unverified: decode::<C>(token, key, &self.unverified)
                                .ok()
                                .map(|data| data.claims),
                        }
                    }
                    _ => Verified::Invalid {
                        error: TokenError::Malformed,
                        unverified: None,
                    },
                };
            }
        };

        if claims.expires_at() <= jsonwebtoken::get_current_timestamp() {
            Verified::Expired(claims)
        } else {
            Verified::Valid(claims)
        }
    }
}

fn unix_seconds(at: DateTime<Utc>) -> u64 {
    at.timestamp().max(0) as u64
}

fn expiry(now: DateTime<Utc>, ttl: TimeDelta) -> Result<u64> {
    now.checked_add_signed(ttl)
        .map(unix_seconds)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Token expiry out of range")))
}
