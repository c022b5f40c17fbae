use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, TransactionBehavior};
use tracing::info;

use fiesta_types::api::{EventPatch, NewEvent, NewWikiArticle, WikiArticlePatch};
use fiesta_types::models::{Event, Session, User, WikiArticle};
use fiesta_types::settings::{Settings, SettingsPatch, SETTINGS_ROW_ID};

use crate::migrations::{self, to_json};
use crate::{Storage, StoreError};

/// SQLite-backed storage. A single connection behind a mutex; SQLite's WAL
/// mode keeps readers cheap and the mutex serializes writers.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run(&conn)?;

        info!("database opened at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migrations::run(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn with_conn<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("connection lock poisoned: {e}")))?;
        f(&conn)
    }

    fn with_conn_mut<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StoreError>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("connection lock poisoned: {e}")))?;
        f(&mut conn)
    }
}

impl Storage for SqliteStorage {
    // -- Users --

    fn list_users(&self) -> Result<Vec<User>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, username, password, is_admin FROM users ORDER BY id DESC",
            )?;
            let rows = stmt
                .query_map([], map_user)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    fn get_user(&self, id: i64) -> Result<Option<User>, StoreError> {
        self.with_conn(|conn| {
            query_optional(
                conn,
                "SELECT id, username, password, is_admin FROM users WHERE id = ?1",
                [id],
                map_user,
            )
        })
    }

    fn get_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        // The username column is COLLATE NOCASE, so plain equality already
        // matches case-insensitively.
        self.with_conn(|conn| {
            query_optional(
                conn,
                "SELECT id, username, password, is_admin FROM users WHERE username = ?1",
                [username],
                map_user,
            )
        })
    }

    fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        is_admin: bool,
    ) -> Result<User, StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (username, password, is_admin) VALUES (?1, ?2, ?3)",
                rusqlite::params![username, password_hash, is_admin],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::DuplicateUsername
                } else {
                    e.into()
                }
            })?;

            Ok(User {
                id: conn.last_insert_rowid(),
                username: username.to_string(),
                password_hash: password_hash.to_string(),
                is_admin,
            })
        })
    }

    fn create_first_admin(&self, username: &str, password_hash: &str) -> Result<User, StoreError> {
        self.with_conn_mut(|conn| {
            // Immediate transaction: the write lock is taken before the
            // admin check, so two racing setup calls serialize here and the
            // loser sees the winner's row.
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let admins: i64 =
                tx.query_row("SELECT COUNT(*) FROM users WHERE is_admin = 1", [], |r| {
                    r.get(0)
                })?;
            if admins > 0 {
                return Err(StoreError::SetupAlreadyComplete);
            }

            tx.execute(
                "INSERT INTO users (username, password, is_admin) VALUES (?1, ?2, 1)",
                rusqlite::params![username, password_hash],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::DuplicateUsername
                } else {
                    e.into()
                }
            })?;
            let id = tx.last_insert_rowid();
            tx.commit()?;

            Ok(User {
                id,
                username: username.to_string(),
                password_hash: password_hash.to_string(),
                is_admin: true,
            })
        })
    }

    fn update_user_password(&self, id: i64, new_hash: &str) -> Result<Option<User>, StoreError> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users SET password = ?1 WHERE id = ?2",
                rusqlite::params![new_hash, id],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_optional(
                conn,
                "SELECT id, username, password, is_admin FROM users WHERE id = ?1",
                [id],
                map_user,
            )
        })
    }

    // -- Sessions --

    fn create_session(&self, session: &Session) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sessions (token, account_id, expires_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![
                    session.token,
                    session.account_id,
                    format_timestamp(session.expires_at)
                ],
            )?;
            Ok(())
        })
    }

    fn get_session(&self, token: &str) -> Result<Option<Session>, StoreError> {
        self.with_conn(|conn| {
            query_optional(
                conn,
                "SELECT token, account_id, expires_at FROM sessions WHERE token = ?1",
                [token],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )?
            .map(|(token, account_id, expires_at)| {
                Ok(Session {
                    token,
                    account_id,
                    expires_at: parse_timestamp(&expires_at)?,
                })
            })
            .transpose()
        })
    }

    fn delete_session(&self, token: &str) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM sessions WHERE token = ?1", [token])?;
            Ok(())
        })
    }

    fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        self.with_conn(|conn| {
            let purged = conn.execute(
                "DELETE FROM sessions WHERE expires_at <= ?1",
                [format_timestamp(now)],
            )?;
            Ok(purged)
        })
    }

    // -- Events --

    fn list_events(&self) -> Result<Vec<Event>, StoreError> {
        self.query_events("SELECT * FROM events ORDER BY created_at DESC, id DESC")
    }

    fn featured_events(&self) -> Result<Vec<Event>, StoreError> {
        self.query_events(
            "SELECT * FROM events WHERE is_featured = 1 ORDER BY created_at DESC, id DESC",
        )
    }

    fn get_event(&self, id: i64) -> Result<Option<Event>, StoreError> {
        self.with_conn(|conn| query_event(conn, id))
    }

    fn create_event(&self, event: &NewEvent) -> Result<Event, StoreError> {
        let created_at = Utc::now();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO events (title, description, date, time, location, category,
                                     image, presenter, presenter_image, is_featured,
                                     registration_link, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                rusqlite::params![
                    event.title,
                    event.description,
                    event.date,
                    event.time,
                    event.location,
                    event.category,
                    event.image,
                    event.presenter,
                    event.presenter_image,
                    event.is_featured,
                    event.registration_link,
                    format_timestamp(created_at),
                ],
            )?;

            Ok(Event {
                id: conn.last_insert_rowid(),
                title: event.title.clone(),
                description: event.description.clone(),
                date: event.date.clone(),
                time: event.time.clone(),
                location: event.location.clone(),
                category: event.category.clone(),
                image: event.image.clone(),
                presenter: event.presenter.clone(),
                presenter_image: event.presenter_image.clone(),
                is_featured: event.is_featured,
                registration_link: event.registration_link.clone(),
                created_at,
            })
        })
    }

    fn update_event(&self, id: i64, patch: &EventPatch) -> Result<Option<Event>, StoreError> {
        self.with_conn(|conn| {
            let Some(mut event) = query_event(conn, id)? else {
                return Ok(None);
            };
            patch.apply_to(&mut event);

            conn.execute(
                "UPDATE events SET title = ?1, description = ?2, date = ?3, time = ?4,
                                   location = ?5, category = ?6, image = ?7, presenter = ?8,
                                   presenter_image = ?9, is_featured = ?10, registration_link = ?11
                 WHERE id = ?12",
                rusqlite::params![
                    event.title,
                    event.description,
                    event.date,
                    event.time,
                    event.location,
                    event.category,
                    event.image,
                    event.presenter,
                    event.presenter_image,
                    event.is_featured,
                    event.registration_link,
                    id,
                ],
            )?;
            Ok(Some(event))
        })
    }

    fn delete_event(&self, id: i64) -> Result<bool, StoreError> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM events WHERE id = ?1", [id])?;
            Ok(deleted > 0)
        })
    }

    // -- Wiki articles --

    fn list_wiki_articles(&self) -> Result<Vec<WikiArticle>, StoreError> {
        self.query_articles("SELECT * FROM wiki_articles ORDER BY created_at DESC, id DESC")
    }

    fn featured_wiki_articles(&self) -> Result<Vec<WikiArticle>, StoreError> {
        self.query_articles(
            "SELECT * FROM wiki_articles WHERE is_featured = 1 ORDER BY created_at DESC, id DESC",
        )
    }

    fn get_wiki_article(&self, id: i64) -> Result<Option<WikiArticle>, StoreError> {
        self.with_conn(|conn| query_article(conn, id))
    }

    fn create_wiki_article(&self, article: &NewWikiArticle) -> Result<WikiArticle, StoreError> {
        let created_at = Utc::now();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO wiki_articles (title, content, category, icon, is_featured, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    article.title,
                    article.content,
                    article.category,
                    article.icon,
                    article.is_featured,
                    format_timestamp(created_at),
                ],
            )?;

            Ok(WikiArticle {
                id: conn.last_insert_rowid(),
                title: article.title.clone(),
                content: article.content.clone(),
                category: article.category.clone(),
                icon: article.icon.clone(),
                is_featured: article.is_featured,
                created_at,
            })
        })
    }

    fn update_wiki_article(
        &self,
        id: i64,
        patch: &WikiArticlePatch,
    ) -> Result<Option<WikiArticle>, StoreError> {
        self.with_conn(|conn| {
            let Some(mut article) = query_article(conn, id)? else {
                return Ok(None);
            };
            patch.apply_to(&mut article);

            conn.execute(
                "UPDATE wiki_articles SET title = ?1, content = ?2, category = ?3,
                                          icon = ?4, is_featured = ?5
                 WHERE id = ?6",
                rusqlite::params![
                    article.title,
                    article.content,
                    article.category,
                    article.icon,
                    article.is_featured,
                    id,
                ],
            )?;
            Ok(Some(article))
        })
    }

    fn delete_wiki_article(&self, id: i64) -> Result<bool, StoreError> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM wiki_articles WHERE id = ?1", [id])?;
            Ok(deleted > 0)
        })
    }

    // -- Settings --

    fn get_settings(&self) -> Result<Option<Settings>, StoreError> {
        self.with_conn(query_settings)
    }

    fn update_settings(&self, patch: SettingsPatch) -> Result<Settings, StoreError> {
        self.with_conn(|conn| {
            // Missing row (never-seeded store) is repaired here from the
            // documented defaults before the patch is applied.
            let mut settings = query_settings(conn)?.unwrap_or_default();
            settings.id = SETTINGS_ROW_ID;
            settings.apply(patch);
            write_settings(conn, &settings)?;
            Ok(settings)
        })
    }
}

impl SqliteStorage {
    fn query_events(&self, sql: &str) -> Result<Vec<Event>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt
                .query_map([], map_event)?
                .collect::<Result<Vec<_>, _>>()?;
            rows.into_iter().map(finish_event).collect()
        })
    }

    fn query_articles(&self, sql: &str) -> Result<Vec<WikiArticle>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt
                .query_map([], map_article)?
                .collect::<Result<Vec<_>, _>>()?;
            rows.into_iter().map(finish_article).collect()
        })
    }
}

// -- Row mapping --

fn map_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        username: row.get("username")?,
        password_hash: row.get("password")?,
        is_admin: row.get("is_admin")?,
    })
}

/// Intermediate event row with the timestamp still as text; RFC 3339
/// parsing happens outside the rusqlite error domain.
struct EventRow {
    event: Event,
    created_at: String,
}

fn map_event(row: &rusqlite::Row<'_>) -> rusqlite::Result<EventRow> {
    Ok(EventRow {
        event: Event {
            id: row.get("id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            date: row.get("date")?,
            time: row.get("time")?,
            location: row.get("location")?,
            category: row.get("category")?,
            image: row.get("image")?,
            presenter: row.get("presenter")?,
            presenter_image: row.get("presenter_image")?,
            is_featured: row.get("is_featured")?,
            registration_link: row.get("registration_link")?,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        },
        created_at: row.get("created_at")?,
    })
}

fn finish_event(row: EventRow) -> Result<Event, StoreError> {
    let mut event = row.event;
    event.created_at = parse_timestamp(&row.created_at)?;
    Ok(event)
}

struct ArticleRow {
    article: WikiArticle,
    created_at: String,
}

fn map_article(row: &rusqlite::Row<'_>) -> rusqlite::Result<ArticleRow> {
    Ok(ArticleRow {
        article: WikiArticle {
            id: row.get("id")?,
            title: row.get("title")?,
            content: row.get("content")?,
            category: row.get("category")?,
            icon: row.get("icon")?,
            is_featured: row.get("is_featured")?,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        },
        created_at: row.get("created_at")?,
    })
}

fn finish_article(row: ArticleRow) -> Result<WikiArticle, StoreError> {
    let mut article = row.article;
    article.created_at = parse_timestamp(&row.created_at)?;
    Ok(article)
}

fn query_event(conn: &Connection, id: i64) -> Result<Option<Event>, StoreError> {
    query_optional(conn, "SELECT * FROM events WHERE id = ?1", [id], map_event)?
        .map(finish_event)
        .transpose()
}

fn query_article(conn: &Connection, id: i64) -> Result<Option<WikiArticle>, StoreError> {
    query_optional(
        conn,
        "SELECT * FROM wiki_articles WHERE id = ?1",
        [id],
        map_article,
    )?
    .map(finish_article)
    .transpose()
}

fn query_settings(conn: &Connection) -> Result<Option<Settings>, StoreError> {
    let row = query_optional(
        conn,
        "SELECT id, carnival_date, contact_email, contact_phone,
                social_facebook, social_twitter, social_instagram, social_youtube,
                contact_mail, social_links, contact_info,
                website_settings, navbar_settings, footer_settings, countdown_settings
         FROM settings WHERE id = ?1",
        [SETTINGS_ROW_ID],
        |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
                row.get::<_, String>(7)?,
                row.get::<_, String>(8)?,
                row.get::<_, String>(9)?,
                row.get::<_, String>(10)?,
                row.get::<_, String>(11)?,
                row.get::<_, String>(12)?,
                row.get::<_, String>(13)?,
                row.get::<_, String>(14)?,
            ))
        },
    )?;

    row.map(|r| {
        Ok(Settings {
            id: r.0,
            carnival_date: r.1,
            contact_email: r.2,
            contact_phone: r.3,
            social_facebook: r.4,
            social_twitter: r.5,
            social_instagram: r.6,
            social_youtube: r.7,
            contact_mail: r.8,
            social_links: from_json(&r.9)?,
            contact_info: from_json(&r.10)?,
            website_settings: from_json(&r.11)?,
            navbar_settings: from_json(&r.12)?,
            footer_settings: from_json(&r.13)?,
            countdown_settings: from_json(&r.14)?,
        })
    })
    .transpose()
}

fn write_settings(conn: &Connection, settings: &Settings) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO settings (
            id, carnival_date, contact_email, contact_phone,
            social_facebook, social_twitter, social_instagram, social_youtube,
            contact_mail, social_links, contact_info,
            website_settings, navbar_settings, footer_settings, countdown_settings
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
         ON CONFLICT(id) DO UPDATE SET
            carnival_date = excluded.carnival_date,
            contact_email = excluded.contact_email,
            contact_phone = excluded.contact_phone,
            social_facebook = excluded.social_facebook,
            social_twitter = excluded.social_twitter,
            social_instagram = excluded.social_instagram,
            social_youtube = excluded.social_youtube,
            contact_mail = excluded.contact_mail,
            social_links = excluded.social_links,
            contact_info = excluded.contact_info,
            website_settings = excluded.website_settings,
            navbar_settings = excluded.navbar_settings,
            footer_settings = excluded.footer_settings,
            countdown_settings = excluded.countdown_settings",
        rusqlite::params![
            SETTINGS_ROW_ID,
            settings.carnival_date,
            settings.contact_email,
            settings.contact_phone,
            settings.social_facebook,
            settings.social_twitter,
            settings.social_instagram,
            settings.social_youtube,
            settings.contact_mail,
            to_json(&settings.social_links)?,
            to_json(&settings.contact_info)?,
            to_json(&settings.website_settings)?,
            to_json(&settings.navbar_settings)?,
            to_json(&settings.footer_settings)?,
            to_json(&settings.countdown_settings)?,
        ],
    )?;
    Ok(())
}

// -- Helpers --

fn query_optional<P, T, F>(
    conn: &Connection,
    sql: &str,
    params: P,
    map: F,
) -> Result<Option<T>, StoreError>
where
    P: rusqlite::Params,
    F: FnOnce(&rusqlite::Row<'_>) -> rusqlite::Result<T>,
{
    match conn.query_row(sql, params, map) {
        Ok(value) => Ok(Some(value)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("bad timestamp {raw:?}: {e}")))
}

fn from_json<T: serde::de::DeserializeOwned>(raw: &str) -> Result<T, StoreError> {
    serde_json::from_str(raw).map_err(|e| StoreError::Corrupt(e.to_string()))
}
