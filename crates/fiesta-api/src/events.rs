use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use fiesta_types::api::{EventPatch, NewEvent};
use fiesta_types::models::Event;

use crate::middleware::RequireAdmin;
use crate::router::AppState;
use crate::{run_blocking, ApiError};

fn validate_new_event(event: &NewEvent) -> Result<(), ApiError> {
    let required = [
        (&event.title, "Title is required"),
        (&event.description, "Description is required"),
        (&event.date, "Date is required"),
        (&event.time, "Time is required"),
        (&event.location, "Location is required"),
        (&event.category, "Category is required"),
        (&event.image, "Image is required"),
        (&event.presenter, "Presenter is required"),
    ];
    for (value, message) in required {
        if value.trim().is_empty() {
            return Err(ApiError::Validation(message.into()));
        }
    }
    Ok(())
}

/// GET /api/events
pub async fn list_events(State(state): State<AppState>) -> Result<Json<Vec<Event>>, ApiError> {
    let storage = state.storage.clone();
    Ok(Json(run_blocking(move || storage.list_events()).await?))
}

/// GET /api/events/featured
pub async fn featured_events(State(state): State<AppState>) -> Result<Json<Vec<Event>>, ApiError> {
    let storage = state.storage.clone();
    Ok(Json(run_blocking(move || storage.featured_events()).await?))
}

/// GET /api/events/{id}
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Event>, ApiError> {
    let storage = state.storage.clone();
    let event = run_blocking(move || storage.get_event(id))
        .await?
        .ok_or(ApiError::NotFound("Event"))?;
    Ok(Json(event))
}

/// POST /api/events (admin)
pub async fn create_event(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Json(event): Json<NewEvent>,
) -> Result<(StatusCode, Json<Event>), ApiError> {
    validate_new_event(&event)?;

    let storage = state.storage.clone();
    let created = run_blocking(move || storage.create_event(&event)).await?;

    info!(id = created.id, title = %created.title, "event created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/events/{id} (admin) — partial update.
pub async fn update_event(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<EventPatch>,
) -> Result<Json<Event>, ApiError> {
    let storage = state.storage.clone();
    let updated = run_blocking(move || storage.update_event(id, &patch))
        .await?
        .ok_or(ApiError::NotFound("Event"))?;
    Ok(Json(updated))
}

/// DELETE /api/events/{id} (admin)
pub async fn delete_event(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let storage = state.storage.clone();
    let deleted = run_blocking(move || storage.delete_event(id)).await?;
    if !deleted {
        return Err(ApiError::NotFound("Event"));
    }

    info!(id, "event deleted");
    Ok(StatusCode::NO_CONTENT)
}
