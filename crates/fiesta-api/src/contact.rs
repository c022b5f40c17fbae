use axum::{extract::State, Json};
use tracing::{info, warn};

use fiesta_types::api::{ContactRequest, ContactResponse};
use fiesta_types::settings::Settings;

use crate::router::AppState;
use crate::{run_blocking, ApiError};

fn validate_contact(form: &ContactRequest) -> Result<(), ApiError> {
    if form.name.trim().len() < 2 {
        return Err(ApiError::Validation(
            "Name must be at least 2 characters".into(),
        ));
    }
    // A full parse happens when the reply-to mailbox is built; this just
    // catches obviously empty or separator-free input early.
    if !form.email.contains('@') {
        return Err(ApiError::Validation(
            "Please enter a valid email address".into(),
        ));
    }
    if form.subject.trim().len() < 5 {
        return Err(ApiError::Validation(
            "Subject must be at least 5 characters".into(),
        ));
    }
    if form.message.trim().len() < 10 {
        return Err(ApiError::Validation(
            "Message must be at least 10 characters".into(),
        ));
    }
    Ok(())
}

/// POST /api/contact — relay a visitor message to the site owner's inbox,
/// as configured by the settings row's `contactMail`.
pub async fn submit(
    State(state): State<AppState>,
    Json(form): Json<ContactRequest>,
) -> Result<Json<ContactResponse>, ApiError> {
    validate_contact(&form)?;

    let Some(mailer) = state.mailer.clone() else {
        warn!("contact form submitted but no SMTP transport is configured");
        return Err(ApiError::Unavailable);
    };

    let storage = state.storage.clone();
    let recipient = run_blocking(move || storage.get_settings())
        .await?
        .map(|s| s.contact_mail)
        .unwrap_or_else(|| Settings::default().contact_mail);

    let sender = form.email.clone();
    run_blocking(move || mailer.send_contact(&form, &recipient)).await?;

    info!(from = %sender, "contact form relayed");
    Ok(Json(ContactResponse {
        success: true,
        message: "Your message has been sent successfully. We'll get back to you soon!".into(),
    }))
}
