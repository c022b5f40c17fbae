pub mod memory;
pub mod migrations;
pub mod sqlite;

use chrono::{DateTime, Utc};
use thiserror::Error;

use fiesta_types::api::{EventPatch, NewEvent, NewWikiArticle, WikiArticlePatch};
use fiesta_types::models::{Event, Session, User, WikiArticle};
use fiesta_types::settings::{Settings, SettingsPatch};

pub use memory::MemStorage;
pub use sqlite::SqliteStorage;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("username already exists")]
    DuplicateUsername,

    #[error("setup already completed")]
    SetupAlreadyComplete,

    /// The backing store is unreachable or rejected the operation for a
    /// transient reason; callers may retry with backoff.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A stored value failed to decode. Not retryable.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

/// Persistence surface for every handler. One trait, two implementations:
/// [`SqliteStorage`] for real deployments and [`MemStorage`] for
/// environments without a database (and for tests).
///
/// All methods are synchronous; async callers run them through
/// `tokio::task::spawn_blocking`.
pub trait Storage: Send + Sync {
    // -- Users --

    fn list_users(&self) -> Result<Vec<User>, StoreError>;
    fn get_user(&self, id: i64) -> Result<Option<User>, StoreError>;
    /// Lookup is case-insensitive, matching the creation-time uniqueness
    /// rule.
    fn get_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
    fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        is_admin: bool,
    ) -> Result<User, StoreError>;
    /// Atomic check-and-insert of the bootstrap administrator: fails with
    /// [`StoreError::SetupAlreadyComplete`] when any admin account exists,
    /// with no window for two racing callers to both succeed.
    fn create_first_admin(&self, username: &str, password_hash: &str) -> Result<User, StoreError>;
    fn update_user_password(&self, id: i64, new_hash: &str) -> Result<Option<User>, StoreError>;

    // -- Sessions --

    fn create_session(&self, session: &Session) -> Result<(), StoreError>;
    fn get_session(&self, token: &str) -> Result<Option<Session>, StoreError>;
    /// Idempotent; deleting an unknown token is not an error.
    fn delete_session(&self, token: &str) -> Result<(), StoreError>;
    fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize, StoreError>;

    // -- Events --

    fn list_events(&self) -> Result<Vec<Event>, StoreError>;
    fn featured_events(&self) -> Result<Vec<Event>, StoreError>;
    fn get_event(&self, id: i64) -> Result<Option<Event>, StoreError>;
    fn create_event(&self, event: &NewEvent) -> Result<Event, StoreError>;
    fn update_event(&self, id: i64, patch: &EventPatch) -> Result<Option<Event>, StoreError>;
    fn delete_event(&self, id: i64) -> Result<bool, StoreError>;

    // -- Wiki articles --

    fn list_wiki_articles(&self) -> Result<Vec<WikiArticle>, StoreError>;
    fn featured_wiki_articles(&self) -> Result<Vec<WikiArticle>, StoreError>;
    fn get_wiki_article(&self, id: i64) -> Result<Option<WikiArticle>, StoreError>;
    fn create_wiki_article(&self, article: &NewWikiArticle) -> Result<WikiArticle, StoreError>;
    fn update_wiki_article(
        &self,
        id: i64,
        patch: &WikiArticlePatch,
    ) -> Result<Option<WikiArticle>, StoreError>;
    fn delete_wiki_article(&self, id: i64) -> Result<bool, StoreError>;

    // -- Settings --

    /// `None` only on a store that was never migrated/seeded.
    fn get_settings(&self) -> Result<Option<Settings>, StoreError>;
    /// Shallow-merges `patch` over the stored row, initializing the row
    /// from defaults first when it is missing. Always leaves exactly one
    /// row with the fixed singleton id.
    fn update_settings(&self, patch: SettingsPatch) -> Result<Settings, StoreError>;
}
