use axum::{extract::State, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde_json::{json, Value};
use tracing::info;

use fiesta_types::api::LoginRequest;
use fiesta_types::models::PublicUser;

use crate::middleware::RequireUser;
use crate::router::AppState;
use crate::session::{self, SESSION_COOKIE};
use crate::{password, run_blocking, ApiError};

fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, token);
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_path("/");
    cookie.set_secure(secure);
    cookie.set_max_age(session::ttl());
    cookie
}

fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::from(SESSION_COOKIE);
    cookie.set_path("/");
    cookie
}

/// POST /api/login
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<PublicUser>), ApiError> {
    let storage = state.storage.clone();
    let username = req.username.clone();
    let user = run_blocking(move || storage.get_user_by_username(&username))
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    let supplied = req.password;
    let stored = user.password_hash.clone();
    let valid =
        run_blocking(move || Ok::<_, ApiError>(password::verify_password(&supplied, &stored)))
            .await?;
    if !valid {
        return Err(ApiError::InvalidCredentials);
    }

    let session = session::new_session(user.id);
    let token = session.token.clone();
    let storage = state.storage.clone();
    run_blocking(move || storage.create_session(&session)).await?;

    info!(username = %user.username, "login");
    let jar = jar.add(session_cookie(token, state.secure_cookies));
    Ok((jar, Json(PublicUser::from(&user))))
}

/// POST /api/logout — idempotent; a missing or unknown cookie is still a
/// successful logout.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<Value>), ApiError> {
    let jar = match jar.get(SESSION_COOKIE) {
        Some(cookie) => {
            let token = cookie.value().to_string();
            let storage = state.storage.clone();
            run_blocking(move || storage.delete_session(&token)).await?;
            jar.remove(removal_cookie())
        }
        None => jar,
    };

    Ok((jar, Json(json!({ "message": "Logged out" }))))
}

/// GET /api/user
pub async fn current_user(RequireUser(user): RequireUser) -> Json<PublicUser> {
    Json(PublicUser {
        id: user.id,
        username: user.username,
        is_admin: user.is_admin,
    })
}
