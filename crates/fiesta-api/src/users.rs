use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use tracing::info;

use fiesta_types::api::{ChangePasswordRequest, CreateUserRequest};
use fiesta_types::models::PublicUser;

use crate::middleware::{RequireAdmin, RequireUser};
use crate::router::AppState;
use crate::{password, run_blocking, ApiError};

pub(crate) fn validate_credentials(username: &str, password: &str) -> Result<(), ApiError> {
    if username.len() < 3 {
        return Err(ApiError::Validation(
            "Username must be at least 3 characters".into(),
        ));
    }
    if password.len() < 8 {
        return Err(ApiError::Validation(
            "Password must be at least 8 characters".into(),
        ));
    }
    Ok(())
}

/// GET /api/users (admin)
pub async fn list_users(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<PublicUser>>, ApiError> {
    let storage = state.storage.clone();
    let users = run_blocking(move || storage.list_users()).await?;
    Ok(Json(users.iter().map(PublicUser::from).collect()))
}

/// POST /api/users (admin)
pub async fn create_user(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<PublicUser>), ApiError> {
    validate_credentials(&req.username, &req.password)?;

    let password = req.password;
    let hash = run_blocking(move || password::hash_password(&password)).await?;

    let storage = state.storage.clone();
    let username = req.username;
    let is_admin = req.is_admin;
    let user = run_blocking(move || storage.create_user(&username, &hash, is_admin)).await?;

    info!(username = %user.username, created_by = %admin.username, "user created");
    Ok((StatusCode::CREATED, Json(PublicUser::from(&user))))
}

/// PUT /api/user/password — change the caller's own password after
/// re-verifying the current one.
pub async fn change_password(
    RequireUser(current): RequireUser,
    State(state): State<AppState>,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<Value>, ApiError> {
    if req.new_password.len() < 8 {
        return Err(ApiError::Validation(
            "Password must be at least 8 characters".into(),
        ));
    }

    let storage = state.storage.clone();
    let id = current.id;
    let user = run_blocking(move || storage.get_user(id))
        .await?
        .ok_or(ApiError::NotFound("User"))?;

    let supplied = req.current_password;
    let stored = user.password_hash;
    let valid =
        run_blocking(move || Ok::<_, ApiError>(password::verify_password(&supplied, &stored)))
            .await?;
    if !valid {
        return Err(ApiError::InvalidCredentials);
    }

    let new_password = req.new_password;
    let hash = run_blocking(move || password::hash_password(&new_password)).await?;

    let storage = state.storage.clone();
    run_blocking(move || storage.update_user_password(id, &hash))
        .await?
        .ok_or(ApiError::NotFound("User"))?;

    info!(username = %current.username, "password updated");
    Ok(Json(json!({ "message": "Password updated" })))
}
