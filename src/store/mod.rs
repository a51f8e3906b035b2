//! Read side of the applicant data store.
//!
//! The answer engine only ever reads through [`UserStore`]. Writes
//! (schema creation, record import) live on the concrete backends and are
//! driven by the CLI.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;

use crate::core::{Profile, Skill};
use crate::error::StoreError;

pub use memory::{InMemoryUserStore, Source};
pub use sqlite::SqliteUserStore;

/// Database location used when none is given.
pub const DEFAULT_DB_PATH: &str = ".autoapply/autoapply.db";

/// Source of one user's profile, skills and résumé.
///
/// The three loads are independent; [`DataRetriever`](crate::agent::DataRetriever)
/// runs them concurrently and tolerates any of them failing.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Loads the profile row (user joined with job settings).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UserNotFound`] if no such user exists, or a
    /// backend error.
    async fn load_profile(&self, user_id: &str) -> Result<Profile, StoreError>;

    /// Loads every skill row for the user, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns a backend error.
    async fn load_skills(&self, user_id: &str) -> Result<Vec<Skill>, StoreError>;

    /// Loads the most recent résumé text. Empty if the user has none.
    ///
    /// # Errors
    ///
    /// Returns a backend error.
    async fn load_resume(&self, user_id: &str) -> Result<String, StoreError>;
}
