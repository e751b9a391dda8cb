// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod session;
pub mod user;

pub use session::{SessionPayload, TokenPair};
pub use user::{KakaoProfile, NewUser, User};
