use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use fiesta_types::api::{EventPatch, NewEvent, NewWikiArticle, WikiArticlePatch};
use fiesta_types::models::{Event, Session, User, WikiArticle};
use fiesta_types::settings::{Settings, SettingsPatch, SETTINGS_ROW_ID};

use crate::{Storage, StoreError};

/// In-process fallback store for environments without a database. Starts
/// with the default settings document and empty entity tables; everything
/// lives behind one mutex, which also makes the first-admin
/// check-and-insert atomic.
pub struct MemStorage {
    inner: Mutex<Inner>,
}

struct Inner {
    users: BTreeMap<i64, User>,
    /// Lowercased username -> id; creation-time case-insensitive
    /// uniqueness, mirroring the SQLite NOCASE column.
    usernames: HashMap<String, i64>,
    sessions: HashMap<String, Session>,
    events: BTreeMap<i64, Event>,
    articles: BTreeMap<i64, WikiArticle>,
    settings: Option<Settings>,
    next_user_id: i64,
    next_event_id: i64,
    next_article_id: i64,
}

impl MemStorage {
    pub fn new() -> Self {
        MemStorage {
            inner: Mutex::new(Inner {
                users: BTreeMap::new(),
                usernames: HashMap::new(),
                sessions: HashMap::new(),
                events: BTreeMap::new(),
                articles: BTreeMap::new(),
                settings: Some(Settings::default()),
                next_user_id: 1,
                next_event_id: 1,
                next_article_id: 1,
            }),
        }
    }

    fn with_inner<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Inner) -> Result<T, StoreError>,
    {
        let mut inner = self
            .inner
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("store lock poisoned: {e}")))?;
        f(&mut inner)
    }
}

impl Default for MemStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Inner {
    fn insert_user(
        &mut self,
        username: &str,
        password_hash: &str,
        is_admin: bool,
    ) -> Result<User, StoreError> {
        let key = username.to_lowercase();
        if self.usernames.contains_key(&key) {
            return Err(StoreError::DuplicateUsername);
        }

        let id = self.next_user_id;
        self.next_user_id += 1;

        let user = User {
            id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            is_admin,
        };
        self.users.insert(id, user.clone());
        self.usernames.insert(key, id);
        Ok(user)
    }
}

impl Storage for MemStorage {
    // -- Users --

    fn list_users(&self) -> Result<Vec<User>, StoreError> {
        self.with_inner(|inner| Ok(inner.users.values().rev().cloned().collect()))
    }

    fn get_user(&self, id: i64) -> Result<Option<User>, StoreError> {
        self.with_inner(|inner| Ok(inner.users.get(&id).cloned()))
    }

    fn get_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        self.with_inner(|inner| {
            let id = inner.usernames.get(&username.to_lowercase()).copied();
            Ok(id.and_then(|id| inner.users.get(&id).cloned()))
        })
    }

    fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        is_admin: bool,
    ) -> Result<User, StoreError> {
        self.with_inner(|inner| inner.insert_user(username, password_hash, is_admin))
    }

    fn create_first_admin(&self, username: &str, password_hash: &str) -> Result<User, StoreError> {
        self.with_inner(|inner| {
            if inner.users.values().any(|u| u.is_admin) {
                return Err(StoreError::SetupAlreadyComplete);
            }
            inner.insert_user(username, password_hash, true)
        })
    }

    fn update_user_password(&self, id: i64, new_hash: &str) -> Result<Option<User>, StoreError> {
        self.with_inner(|inner| {
            Ok(inner.users.get_mut(&id).map(|user| {
                user.password_hash = new_hash.to_string();
                user.clone()
            }))
        })
    }

    // -- Sessions --

    fn create_session(&self, session: &Session) -> Result<(), StoreError> {
        self.with_inner(|inner| {
            inner.sessions.insert(session.token.clone(), session.clone());
            Ok(())
        })
    }

    fn get_session(&self, token: &str) -> Result<Option<Session>, StoreError> {
        self.with_inner(|inner| Ok(inner.sessions.get(token).cloned()))
    }

    fn delete_session(&self, token: &str) -> Result<(), StoreError> {
        self.with_inner(|inner| {
            inner.sessions.remove(token);
            Ok(())
        })
    }

    fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        self.with_inner(|inner| {
            let before = inner.sessions.len();
            inner.sessions.retain(|_, s| !s.is_expired(now));
            Ok(before - inner.sessions.len())
        })
    }

    // -- Events --

    fn list_events(&self) -> Result<Vec<Event>, StoreError> {
        self.with_inner(|inner| Ok(inner.events.values().rev().cloned().collect()))
    }

    fn featured_events(&self) -> Result<Vec<Event>, StoreError> {
        self.with_inner(|inner| {
            Ok(inner
                .events
                .values()
                .rev()
                .filter(|e| e.is_featured)
                .cloned()
                .collect())
        })
    }

    fn get_event(&self, id: i64) -> Result<Option<Event>, StoreError> {
        self.with_inner(|inner| Ok(inner.events.get(&id).cloned()))
    }

    fn create_event(&self, event: &NewEvent) -> Result<Event, StoreError> {
        self.with_inner(|inner| {
            let id = inner.next_event_id;
            inner.next_event_id += 1;

            let event = Event {
                id,
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
                created_at: Utc::now(),
            };
            inner.events.insert(id, event.clone());
            Ok(event)
        })
    }

    fn update_event(&self, id: i64, patch: &EventPatch) -> Result<Option<Event>, StoreError> {
        self.with_inner(|inner| {
            Ok(inner.events.get_mut(&id).map(|event| {
                patch.apply_to(event);
                event.clone()
            }))
        })
    }

    fn delete_event(&self, id: i64) -> Result<bool, StoreError> {
        self.with_inner(|inner| Ok(inner.events.remove(&id).is_some()))
    }

    // -- Wiki articles --

    fn list_wiki_articles(&self) -> Result<Vec<WikiArticle>, StoreError> {
        self.with_inner(|inner| Ok(inner.articles.values().rev().cloned().collect()))
    }

    fn featured_wiki_articles(&self) -> Result<Vec<WikiArticle>, StoreError> {
        self.with_inner(|inner| {
            Ok(inner
                .articles
                .values()
                .rev()
                .filter(|a| a.is_featured)
                .cloned()
                .collect())
        })
    }

    fn get_wiki_article(&self, id: i64) -> Result<Option<WikiArticle>, StoreError> {
        self.with_inner(|inner| Ok(inner.articles.get(&id).cloned()))
    }

    fn create_wiki_article(&self, article: &NewWikiArticle) -> Result<WikiArticle, StoreError> {
        self.with_inner(|inner| {
            let id = inner.next_article_id;
            inner.next_article_id += 1;

            let article = WikiArticle {
                id,
                title: article.title.clone(),
                content: article.content.clone(),
                category: article.category.clone(),
                icon: article.icon.clone(),
                is_featured: article.is_featured,
                created_at: Utc::now(),
            };
            inner.articles.insert(id, article.clone());
            Ok(article)
        })
    }

    fn update_wiki_article(
        &self,
        id: i64,
        patch: &WikiArticlePatch,
    ) -> Result<Option<WikiArticle>, StoreError> {
        self.with_inner(|inner| {
            Ok(inner.articles.get_mut(&id).map(|article| {
                patch.apply_to(article);
                article.clone()
            }))
        })
    }

    fn delete_wiki_article(&self, id: i64) -> Result<bool, StoreError> {
        self.with_inner(|inner| Ok(inner.articles.remove(&id).is_some()))
    }

    // -- Settings --

    fn get_settings(&self) -> Result<Option<Settings>, StoreError> {
        self.with_inner(|inner| Ok(inner.settings.clone()))
    }

    fn update_settings(&self, patch: SettingsPatch) -> Result<Settings, StoreError> {
        self.with_inner(|inner| {
            let mut settings = inner.settings.take().unwrap_or_default();
            settings.id = SETTINGS_ROW_ID;
            settings.apply(patch);
            inner.settings = Some(settings.clone());
            Ok(settings)
        })
    }
}
