use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Full account record as stored. Intentionally implements neither
/// `Serialize` nor `Deserialize`: the password hash must never cross the
/// wire. Responses use [`PublicUser`].
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub is_admin: bool,
}

/// The projection of an account that is safe to return to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: i64,
    pub username: String,
    pub is_admin: bool,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        PublicUser {
            id: user.id,
            username: user.username.clone(),
            is_admin: user.is_admin,
        }
    }
}

/// Server-side login session, referenced by the opaque cookie token.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub account_id: i64,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub description: String,
    /// Free-text, e.g. "September 15, 2026".
    pub date: String,
    /// Free-text, e.g. "9:00 AM - 4:00 PM".
    pub time: String,
    pub location: String,
    pub category: String,
    pub image: String,
    pub presenter: String,
    pub presenter_image: Option<String>,
    pub is_featured: bool,
    pub registration_link: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WikiArticle {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub category: String,
    pub icon: String,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
}
