use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Json, Router,
};

use fiesta_db::Storage;
use fiesta_types::api::HealthResponse;

use crate::mailer::Mailer;
use crate::{auth, contact, events, middleware, settings, setup, users, wiki, ApiError};

/// Shared application state for all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub mailer: Option<Arc<Mailer>>,
    /// Set the `Secure` attribute on session cookies (production only).
    pub secure_cookies: bool,
}

/// Assemble the full `/api` surface. Admin gating happens per handler via
/// the `RequireAdmin` extractor; the identity middleware below resolves
/// the session cookie once for every request.
pub fn api_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/", get(health))
        // Setup
        .route("/setup/check", get(setup::check))
        .route("/setup", post(setup::run_setup))
        // Auth
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/user", get(auth::current_user))
        .route("/user/password", put(users::change_password))
        // Admin user management
        .route("/users", get(users::list_users).post(users::create_user))
        // Settings
        .route(
            "/settings",
            get(settings::get_settings).put(settings::update_settings),
        )
        // Events
        .route("/events", get(events::list_events).post(events::create_event))
        .route("/events/featured", get(events::featured_events))
        .route(
            "/events/{id}",
            get(events::get_event)
                .put(events::update_event)
                .delete(events::delete_event),
        )
        // Wiki
        .route("/wiki", get(wiki::list_articles).post(wiki::create_article))
        .route("/wiki/featured", get(wiki::featured_articles))
        .route(
            "/wiki/{id}",
            get(wiki::get_article)
                .put(wiki::update_article)
                .delete(wiki::delete_article),
        )
        // Contact form
        .route("/contact", post(contact::submit))
        .fallback(api_not_found)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::resolve_identity,
        ))
        .with_state(state);

    Router::new().nest("/api", api)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        message: "API is running",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn api_not_found() -> ApiError {
    ApiError::NotFound("API endpoint")
}
