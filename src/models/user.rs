//! User model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User record stored in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Directory row ID (embedded in refresh tokens)
    pub id: i64,
    /// Internal identity, assigned once at creation
    pub uuid: String,
    /// Kakao user ID (unique when present)
    pub kakao_id: Option<i64>,
    /// Email address (may be None if not shared)
    pub email: Option<String>,
    pub nickname: Option<String>,
    /// Profile picture URL
    pub profile_image_url: Option<String>,
    pub thumbnail_image_url: Option<String>,
    /// When the user first logged in
    pub created_at: DateTime<Utc>,
}

/// Fields for a user that has not been inserted yet.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub uuid: String,
    pub kakao_id: i64,
    pub email: Option<String>,
    pub nickname: Option<String>,
    pub profile_image_url: Option<String>,
    pub thumbnail_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewUser {
    /// Build a new user from a Kakao profile with a fresh internal identity.
    pub fn from_profile(profile: &KakaoProfile, created_at: DateTime<Utc>) -> Self {
        Self {
            uuid: uuid::Uuid::new_v4().to_string(),
            kakao_id: profile.kakao_id,
            email: profile.email.clone(),
            nickname: profile.nickname.clone(),
            profile_image_url: profile.profile_image_url.clone(),
            thumbnail_image_url: profile.thumbnail_image_url.clone(),
            created_at,
        }
    }

    /// Attach the directory-assigned row ID.
    pub fn into_user(self, id: i64) -> User {
        User {
            id,
            uuid: self.uuid,
            kakao_id: Some(self.kakao_id),
            email: self.email,
            nickname: self.nickname,
            profile_image_url: self.profile_image_url,
            thumbnail_image_url: self.thumbnail_image_url,
            created_at: self.created_at,
        }
    }
}

/// Identity and profile attributes returned by Kakao.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KakaoProfile {
    pub kakao_id: i64,
    pub email: Option<String>,
    pub nickname: Option<String>,
    pub profile_image_url: Option<String>,
    pub thumbnail_image_url: Option<String>,
}
