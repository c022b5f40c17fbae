use rusqlite::Connection;
use tracing::info;

use fiesta_types::settings::{Settings, SETTINGS_ROW_ID};

use crate::StoreError;

/// Idempotent schema setup: every statement is a no-op on an already
/// migrated database.
pub fn run(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            username    TEXT NOT NULL COLLATE NOCASE UNIQUE,
            password    TEXT NOT NULL,
            is_admin    INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS sessions (
            token       TEXT PRIMARY KEY,
            account_id  INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            expires_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_sessions_expiry
            ON sessions(expires_at);

        CREATE TABLE IF NOT EXISTS events (
            id                INTEGER PRIMARY KEY AUTOINCREMENT,
            title             TEXT NOT NULL,
            description       TEXT NOT NULL,
            date              TEXT NOT NULL,
            time              TEXT NOT NULL,
            location          TEXT NOT NULL,
            category          TEXT NOT NULL,
            image             TEXT NOT NULL,
            presenter         TEXT NOT NULL,
            presenter_image   TEXT,
            is_featured       INTEGER NOT NULL DEFAULT 0,
            registration_link TEXT,
            created_at        TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS wiki_articles (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            title       TEXT NOT NULL,
            content     TEXT NOT NULL,
            category    TEXT NOT NULL,
            icon        TEXT NOT NULL,
            is_featured INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS settings (
            id                 INTEGER PRIMARY KEY CHECK (id = 1),
            carnival_date      TEXT NOT NULL,
            contact_email      TEXT NOT NULL,
            contact_phone      TEXT NOT NULL,
            social_facebook    TEXT NOT NULL,
            social_twitter     TEXT NOT NULL,
            social_instagram   TEXT NOT NULL,
            social_youtube     TEXT NOT NULL,
            contact_mail       TEXT NOT NULL,
            social_links       TEXT NOT NULL,
            contact_info       TEXT NOT NULL,
            website_settings   TEXT NOT NULL,
            navbar_settings    TEXT NOT NULL,
            footer_settings    TEXT NOT NULL,
            countdown_settings TEXT NOT NULL
        );
        ",
    )?;

    seed_default_settings(conn)?;

    info!("database migrations complete");
    Ok(())
}

/// Seed the singleton settings row so a fresh database serves defaults
/// immediately. `INSERT OR IGNORE` keeps an existing row untouched.
fn seed_default_settings(conn: &Connection) -> Result<(), StoreError> {
    let defaults = Settings::default();

    conn.execute(
        "INSERT OR IGNORE INTO settings (
            id, carnival_date, contact_email, contact_phone,
            social_facebook, social_twitter, social_instagram, social_youtube,
            contact_mail, social_links, contact_info,
            website_settings, navbar_settings, footer_settings, countdown_settings
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        rusqlite::params![
            SETTINGS_ROW_ID,
            defaults.carnival_date,
            defaults.contact_email,
            defaults.contact_phone,
            defaults.social_facebook,
            defaults.social_twitter,
            defaults.social_instagram,
            defaults.social_youtube,
            defaults.contact_mail,
            to_json(&defaults.social_links)?,
            to_json(&defaults.contact_info)?,
            to_json(&defaults.website_settings)?,
            to_json(&defaults.navbar_settings)?,
            to_json(&defaults.footer_settings)?,
            to_json(&defaults.countdown_settings)?,
        ],
    )?;
    Ok(())
}

pub(crate) fn to_json<T: serde::Serialize>(value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(|e| StoreError::Corrupt(e.to_string()))
}
