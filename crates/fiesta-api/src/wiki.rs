use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use fiesta_types::api::{NewWikiArticle, WikiArticlePatch};
use fiesta_types::models::WikiArticle;

use crate::middleware::RequireAdmin;
use crate::router::AppState;
use crate::{run_blocking, ApiError};

fn validate_new_article(article: &NewWikiArticle) -> Result<(), ApiError> {
    let required = [
        (&article.title, "Title is required"),
        (&article.content, "Content is required"),
        (&article.category, "Category is required"),
        (&article.icon, "Icon is required"),
    ];
    for (value, message) in required {
        if value.trim().is_empty() {
            return Err(ApiError::Validation(message.into()));
        }
    }
    Ok(())
}

/// GET /api/wiki
pub async fn list_articles(
    State(state): State<AppState>,
) -> Result<Json<Vec<WikiArticle>>, ApiError> {
    let storage = state.storage.clone();
    Ok(Json(
        run_blocking(move || storage.list_wiki_articles()).await?,
    ))
}

/// GET /api/wiki/featured
pub async fn featured_articles(
    State(state): State<AppState>,
) -> Result<Json<Vec<WikiArticle>>, ApiError> {
    let storage = state.storage.clone();
    Ok(Json(
        run_blocking(move || storage.featured_wiki_articles()).await?,
    ))
}

/// GET /api/wiki/{id}
pub async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<WikiArticle>, ApiError> {
    let storage = state.storage.clone();
    let article = run_blocking(move || storage.get_wiki_article(id))
        .await?
        .ok_or(ApiError::NotFound("Wiki article"))?;
    Ok(Json(article))
}

/// POST /api/wiki (admin)
pub async fn create_article(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Json(article): Json<NewWikiArticle>,
) -> Result<(StatusCode, Json<WikiArticle>), ApiError> {
    validate_new_article(&article)?;

    let storage = state.storage.clone();
    let created = run_blocking(move || storage.create_wiki_article(&article)).await?;

    info!(id = created.id, title = %created.title, "wiki article created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/wiki/{id} (admin) — partial update.
pub async fn update_article(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<WikiArticlePatch>,
) -> Result<Json<WikiArticle>, ApiError> {
    let storage = state.storage.clone();
    let updated = run_blocking(move || storage.update_wiki_article(id, &patch))
        .await?
        .ok_or(ApiError::NotFound("Wiki article"))?;
    Ok(Json(updated))
}

/// DELETE /api/wiki/{id} (admin)
pub async fn delete_article(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let storage = state.storage.clone();
    let deleted = run_blocking(move || storage.delete_wiki_article(id)).await?;
    if !deleted {
        return Err(ApiError::NotFound("Wiki article"));
    }

    info!(id, "wiki article deleted");
    Ok(StatusCode::NO_CONTENT)
}
