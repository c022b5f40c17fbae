pub mod auth;
pub mod contact;
pub mod error;
pub mod events;
pub mod mailer;
pub mod middleware;
pub mod password;
pub mod router;
pub mod session;
pub mod settings;
pub mod setup;
pub mod users;
pub mod wiki;

pub use error::ApiError;
pub use router::{api_router, AppState};

/// Run a synchronous store or KDF operation off the async runtime. Every
/// handler goes through here for anything that touches SQLite or hashes a
/// password.
pub(crate) async fn run_blocking<T, E, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<ApiError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(format!("blocking task join error: {e}")))?
        .map_err(Into::into)
}
