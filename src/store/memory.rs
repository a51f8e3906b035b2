//! In-memory user store for tests and embedding.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use super::UserStore;
use crate::core::{Profile, Skill, UserRecord};
use crate::error::StoreError;

/// Which sub-record load to act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Profile row.
    Profile,
    /// Skill rows.
    Skills,
    /// Résumé text.
    Resume,
}

impl Source {
    const fn index(self) -> usize {
        match self {
            Self::Profile => 0,
            Self::Skills => 1,
            Self::Resume => 2,
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Skills => "skills",
            Self::Resume => "resume",
        }
    }
}

/// Store holding [`UserRecord`]s in a map.
///
/// Each source can be switched to fail, and every load is counted, so
/// tests can check degradation and load-once behaviour.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<String, UserRecord>>,
    failing: [AtomicBool; 3],
    loads: [AtomicUsize; 3],
}

impl InMemoryUserStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a user and returns the store.
    #[must_use]
    pub fn with_user(self, record: UserRecord) -> Self {
        self.insert(record);
        self
    }

    /// Inserts or replaces a user.
    pub fn insert(&self, record: UserRecord) {
        self.users
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(record.user_id.clone(), record);
    }

    /// Makes every subsequent load of `source` fail (or succeed again).
    pub fn set_failing(&self, source: Source, failing: bool) {
        self.failing[source.index()].store(failing, Ordering::SeqCst);
    }

    /// Number of loads attempted for `source`.
    #[must_use]
    pub fn load_count(&self, source: Source) -> usize {
        self.loads[source.index()].load(Ordering::SeqCst)
    }

    fn begin(&self, source: Source) -> Result<(), StoreError> {
        self.loads[source.index()].fetch_add(1, Ordering::SeqCst);
        if self.failing[source.index()].load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable {
                source_name: source.label(),
            });
        }
        Ok(())
    }

    fn read<T>(&self, user_id: &str, f: impl FnOnce(&UserRecord) -> T) -> Option<T> {
        self.users
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(user_id)
            .map(f)
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn load_profile(&self, user_id: &str) -> Result<Profile, StoreError> {
        self.begin(Source::Profile)?;
        self.read(user_id, |r| Profile::from(r.profile.clone()))
            .ok_or_else(|| StoreError::UserNotFound {
                user_id: user_id.to_string(),
            })
    }

    async fn load_skills(&self, user_id: &str) -> Result<Vec<Skill>, StoreError> {
        self.begin(Source::Skills)?;
        Ok(self
            .read(user_id, |r| r.skills.clone())
            .unwrap_or_default())
    }

    async fn load_resume(&self, user_id: &str) -> Result<String, StoreError> {
        self.begin(Source::Resume)?;
        Ok(self
            .read(user_id, |r| r.resume.clone())
            .unwrap_or_default())
    }
}
