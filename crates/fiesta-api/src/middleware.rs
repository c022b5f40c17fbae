use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;

use crate::router::AppState;
use crate::session::SESSION_COOKIE;
use crate::{run_blocking, ApiError};

/// Identity resolved from the session cookie, attached to request
/// extensions by [`resolve_identity`]. Handlers read this instead of
/// touching the session store again.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    pub is_admin: bool,
}

/// Boundary middleware: resolve the session cookie to an account exactly
/// once per request. Requests without a valid, unexpired session simply
/// proceed anonymously; rejecting is left to the extractors below.
pub async fn resolve_identity(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        let token = cookie.value().to_string();
        let storage = state.storage.clone();

        let account = run_blocking(move || {
            let Some(session) = storage.get_session(&token)? else {
                return Ok(None);
            };
            if session.is_expired(Utc::now()) {
                return Ok(None);
            }
            storage.get_user(session.account_id)
        })
        .await?;

        if let Some(user) = account {
            req.extensions_mut().insert(CurrentUser {
                id: user.id,
                username: user.username,
                is_admin: user.is_admin,
            });
        }
    }

    Ok(next.run(req).await)
}

/// Extractor for routes that need any authenticated account.
pub struct RequireUser(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .map(RequireUser)
            .ok_or(ApiError::Unauthorized)
    }
}

/// Extractor for the admin-only write surface: 401 for anonymous callers,
/// 403 for authenticated non-admins.
pub struct RequireAdmin(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<CurrentUser>() {
            None => Err(ApiError::Unauthorized),
            Some(user) if !user.is_admin => Err(ApiError::Forbidden),
            Some(user) => Ok(RequireAdmin(user.clone())),
        }
    }
}
