use axum::{extract::State, http::StatusCode, Json};
use tracing::info;

use fiesta_types::api::SetupRequest;
use fiesta_types::models::PublicUser;

use crate::router::AppState;
use crate::users::validate_credentials;
use crate::{password, run_blocking, ApiError};

/// GET /api/setup/check — has the first admin been created yet?
pub async fn check(State(state): State<AppState>) -> Result<Json<bool>, ApiError> {
    let storage = state.storage.clone();
    let users = run_blocking(move || storage.list_users()).await?;
    Ok(Json(users.iter().any(|u| u.is_admin)))
}

/// POST /api/setup — one-shot bootstrap of the first administrator. The
/// created account is an admin no matter what the payload says, and the
/// store refuses a second bootstrap atomically.
pub async fn run_setup(
    State(state): State<AppState>,
    Json(req): Json<SetupRequest>,
) -> Result<(StatusCode, Json<PublicUser>), ApiError> {
    validate_credentials(&req.username, &req.password)?;

    let password = req.password;
    let hash = run_blocking(move || password::hash_password(&password)).await?;

    let storage = state.storage.clone();
    let username = req.username;
    let user = run_blocking(move || storage.create_first_admin(&username, &hash)).await?;

    info!(username = %user.username, "setup complete, first admin created");
    Ok((StatusCode::CREATED, Json(PublicUser::from(&user))))
}
