use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use thiserror::Error;
use tracing::warn;

use fiesta_types::api::ContactRequest;

use crate::ApiError;

#[derive(Debug, Clone)]
pub struct MailerConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Sender mailbox, e.g. `"Science Carnival <noreply@school.edu>"`.
    pub from: String,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid mailbox address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("smtp failure: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

impl From<MailError> for ApiError {
    fn from(err: MailError) -> Self {
        match err {
            // The visitor's reply-to address failed to parse.
            MailError::Address(_) => {
                ApiError::Validation("Please enter a valid email address".into())
            }
            MailError::Message(e) => ApiError::Internal(format!("mail build failed: {e}")),
            MailError::Smtp(e) => {
                warn!(error = %e, "smtp relay failed");
                ApiError::Unavailable
            }
        }
    }
}

/// SMTP relay for contact-form submissions. Sends are synchronous and run
/// through `spawn_blocking` like every other blocking call.
pub struct Mailer {
    transport: SmtpTransport,
    from: Mailbox,
}

impl Mailer {
    pub fn new(config: &MailerConfig) -> Result<Self, MailError> {
        let from: Mailbox = config.from.parse()?;
        let transport = SmtpTransport::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Mailer { transport, from })
    }

    /// Check the relay is reachable and accepts our credentials. Used at
    /// startup in development; never fatal.
    pub fn verify(&self) -> bool {
        self.transport.test_connection().unwrap_or(false)
    }

    pub fn send_contact(&self, form: &ContactRequest, to: &str) -> Result<(), MailError> {
        let to: Mailbox = to.parse()?;
        let reply_to: Mailbox = form.email.parse()?;

        let body = format!(
            "Name: {}\nEmail: {}\nSubject: {}\n\nMessage:\n{}\n",
            form.name, form.email, form.subject, form.message
        );

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .reply_to(reply_to)
            .subject(format!("Contact Form: {}", form.subject))
            .body(body)?;

        self.transport.send(&email)?;
        Ok(())
    }
}
