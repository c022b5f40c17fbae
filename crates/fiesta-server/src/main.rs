use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use fiesta_api::mailer::{Mailer, MailerConfig};
use fiesta_api::{api_router, AppState};
use fiesta_db::{MemStorage, SqliteStorage, Storage, StoreError};

/// How often expired sessions are swept out of the store.
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fiesta=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let host = std::env::var("FIESTA_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("FIESTA_PORT")
        .unwrap_or_else(|_| "5000".into())
        .parse()?;
    let db_path = std::env::var("FIESTA_DB_PATH").unwrap_or_else(|_| "fiesta.db".into());
    let production = std::env::var("FIESTA_ENV")
        .map(|v| v == "production")
        .unwrap_or(false);
    let static_dir = std::env::var("FIESTA_STATIC_DIR").unwrap_or_else(|_| "dist".into());

    // Storage: SQLite normally, the in-memory store for database-less
    // environments. Nothing here survives a restart in memory mode.
    let storage: Arc<dyn Storage> = if db_path.is_empty() || db_path == "memory" {
        warn!("no database configured, using the in-memory store");
        Arc::new(MemStorage::new())
    } else {
        let store = open_with_retry(Path::new(&db_path), 3, Duration::from_millis(500)).await?;
        Arc::new(store)
    };

    // Optional SMTP relay for the contact form
    let mailer = mailer_from_env()?.map(Arc::new);
    match &mailer {
        Some(mailer) if !production => {
            let mailer = mailer.clone();
            let reachable = tokio::task::spawn_blocking(move || mailer.verify()).await?;
            if reachable {
                info!("SMTP relay verified");
            } else {
                warn!("SMTP relay configured but unreachable");
            }
        }
        Some(_) => {}
        None => info!("no SMTP relay configured, contact form disabled"),
    }

    // Hourly sweep of expired sessions
    tokio::spawn(run_session_sweeper(storage.clone()));

    let state = AppState {
        storage,
        mailer,
        secure_cookies: production,
    };

    let app = api_router(state)
        .fallback_service(static_site(&static_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("fiesta server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Open the SQLite store with bounded retry and doubling backoff. Invoked
/// from the startup sequence only; a database that stays unreachable
/// through every attempt is fatal.
async fn open_with_retry(
    path: &Path,
    attempts: u32,
    base_delay: Duration,
) -> Result<SqliteStorage, StoreError> {
    let mut delay = base_delay;
    let mut attempt = 0;
    loop {
        attempt += 1;
        match SqliteStorage::open(path) {
            Ok(store) => return Ok(store),
            Err(e) => {
                if attempt >= attempts {
                    return Err(e);
                }
                warn!(attempt, error = %e, "database open failed, retrying in {:?}", delay);
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
        }
    }
}

fn mailer_from_env() -> anyhow::Result<Option<Mailer>> {
    let Ok(host) = std::env::var("FIESTA_SMTP_HOST") else {
        return Ok(None);
    };
    let port: u16 = std::env::var("FIESTA_SMTP_PORT")
        .unwrap_or_else(|_| "587".into())
        .parse()?;
    let username = std::env::var("FIESTA_SMTP_USERNAME").unwrap_or_default();
    let password = std::env::var("FIESTA_SMTP_PASSWORD").unwrap_or_default();
    let from = std::env::var("FIESTA_SMTP_FROM").unwrap_or_else(|_| username.clone());

    let mailer = Mailer::new(&MailerConfig {
        host,
        port,
        username,
        password,
        from,
    })?;
    Ok(Some(mailer))
}

async fn run_session_sweeper(storage: Arc<dyn Storage>) {
    let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
    loop {
        interval.tick().await;
        let store = storage.clone();
        let result =
            tokio::task::spawn_blocking(move || store.purge_expired_sessions(chrono::Utc::now()))
                .await;
        match result {
            Ok(Ok(0)) => {}
            Ok(Ok(purged)) => info!(purged, "swept expired sessions"),
            Ok(Err(e)) => warn!(error = %e, "session sweep failed"),
            Err(e) => warn!(error = %e, "session sweep task panicked"),
        }
    }
}

/// The built frontend is served as static files; unknown non-API paths
/// fall back to index.html for client-side routing.
fn static_site(dir: &str) -> ServeDir<ServeFile> {
    let index = Path::new(dir).join("index.html");
    ServeDir::new(dir).fallback(ServeFile::new(index))
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
