use axum::{extract::State, Json};
use tracing::info;

use fiesta_types::settings::{Settings, SettingsPatch};

use crate::middleware::RequireAdmin;
use crate::router::AppState;
use crate::{run_blocking, ApiError};

/// GET /api/settings — public; the storefront needs branding and the
/// countdown configuration before anyone logs in.
pub async fn get_settings(State(state): State<AppState>) -> Result<Json<Settings>, ApiError> {
    let storage = state.storage.clone();
    let settings = run_blocking(move || storage.get_settings())
        .await?
        .ok_or(ApiError::NotFound("Settings"))?;
    Ok(Json(settings))
}

/// PUT /api/settings (admin) — shallow-merge a partial document over the
/// singleton row; the store repairs a missing row from defaults first.
pub async fn update_settings(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(patch): Json<SettingsPatch>,
) -> Result<Json<Settings>, ApiError> {
    let storage = state.storage.clone();
    let updated = run_blocking(move || storage.update_settings(patch)).await?;

    info!(updated_by = %admin.username, "settings updated");
    Ok(Json(updated))
}
