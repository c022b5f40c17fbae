use serde::{Deserialize, Serialize};

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

// -- Setup --

/// First-run bootstrap payload. An `isAdmin` field is deliberately not
/// accepted here: the first account is always an administrator.
#[derive(Debug, Deserialize)]
pub struct SetupRequest {
    pub username: String,
    pub password: String,
}

// -- Admin user management --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

// -- Events --

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub date: String,
    pub time: String,
    pub location: String,
    pub category: String,
    pub image: String,
    pub presenter: String,
    pub presenter_image: Option<String>,
    #[serde(default)]
    pub is_featured: bool,
    pub registration_link: Option<String>,
}

/// Partial event update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub image: Option<String>,
    pub presenter: Option<String>,
    pub presenter_image: Option<String>,
    pub is_featured: Option<bool>,
    pub registration_link: Option<String>,
}

impl EventPatch {
    /// Copy every supplied field onto `event`.
    pub fn apply_to(&self, event: &mut crate::models::Event) {
        if let Some(v) = &self.title {
            event.title = v.clone();
        }
        if let Some(v) = &self.description {
            event.description = v.clone();
        }
        if let Some(v) = &self.date {
            event.date = v.clone();
        }
        if let Some(v) = &self.time {
            event.time = v.clone();
        }
        if let Some(v) = &self.location {
            event.location = v.clone();
        }
        if let Some(v) = &self.category {
            event.category = v.clone();
        }
        if let Some(v) = &self.image {
            event.image = v.clone();
        }
        if let Some(v) = &self.presenter {
            event.presenter = v.clone();
        }
        if let Some(v) = &self.presenter_image {
            event.presenter_image = Some(v.clone());
        }
        if let Some(v) = self.is_featured {
            event.is_featured = v;
        }
        if let Some(v) = &self.registration_link {
            event.registration_link = Some(v.clone());
        }
    }
}

// -- Wiki articles --

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWikiArticle {
    pub title: String,
    pub content: String,
    pub category: String,
    pub icon: String,
    #[serde(default)]
    pub is_featured: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WikiArticlePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub icon: Option<String>,
    pub is_featured: Option<bool>,
}

impl WikiArticlePatch {
    pub fn apply_to(&self, article: &mut crate::models::WikiArticle) {
        if let Some(v) = &self.title {
            article.title = v.clone();
        }
        if let Some(v) = &self.content {
            article.content = v.clone();
        }
        if let Some(v) = &self.category {
            article.category = v.clone();
        }
        if let Some(v) = &self.icon {
            article.icon = v.clone();
        }
        if let Some(v) = self.is_featured {
            article.is_featured = v;
        }
    }
}

// -- Contact form --

#[derive(Debug, Clone, Deserialize)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub success: bool,
    pub message: String,
}

// -- Health --

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub version: &'static str,
}
