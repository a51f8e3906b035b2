//! `SQLite`-backed user store.
//!
//! Queries run on the blocking pool; the connection sits behind a
//! `std::sync::Mutex` that is only locked inside `spawn_blocking`.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info};

use super::UserStore;
use crate::core::{Profile, Skill, UserRecord};
use crate::error::StoreError;

const SCHEMA: &str = "\
    CREATE TABLE IF NOT EXISTS users (\
        id TEXT PRIMARY KEY,\
        name TEXT,\
        email TEXT,\
        phone TEXT,\
        location TEXT,\
        date_of_birth TEXT\
    );\
    CREATE TABLE IF NOT EXISTS job_settings (\
        user_id TEXT PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,\
        target_role TEXT,\
        current_ctc TEXT,\
        expected_ctc TEXT,\
        notice_period TEXT,\
        years_of_experience TEXT,\
        availability TEXT\
    );\
    CREATE TABLE IF NOT EXISTS skills (\
        id INTEGER PRIMARY KEY AUTOINCREMENT,\
        user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,\
        name TEXT NOT NULL,\
        display_name TEXT,\
        rating INTEGER,\
        rating_scale INTEGER,\
        years_of_experience REAL\
    );\
    CREATE INDEX IF NOT EXISTS idx_skills_user_id ON skills(user_id);\
    CREATE TABLE IF NOT EXISTS resumes (\
        user_id TEXT PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,\
        content TEXT NOT NULL,\
        updated_at TEXT NOT NULL\
    );";

const DROP_SCHEMA: &str = "\
    DROP TABLE IF EXISTS resumes;\
    DROP TABLE IF EXISTS skills;\
    DROP TABLE IF EXISTS job_settings;\
    DROP TABLE IF EXISTS users;";

const PROFILE_QUERY: &str = "\
    SELECT u.name, u.email, u.phone, u.location, u.date_of_birth,\
           j.target_role, j.current_ctc, j.expected_ctc, j.notice_period,\
           j.years_of_experience, j.availability \
    FROM users u LEFT JOIN job_settings j ON j.user_id = u.id \
    WHERE u.id = ?1";

/// User store over a single `SQLite` connection.
#[derive(Debug, Clone)]
pub struct SqliteUserStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteUserStore {
    /// Opens (or creates) the database at `path` and ensures the schema exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] if the file cannot be opened or the
    /// schema cannot be created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path.as_ref())?;
        Self::from_connection(conn)
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] if the schema cannot be created.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// (Re)creates the schema. With `force`, existing tables are dropped first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] on failure.
    pub fn init(&self, force: bool) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        if force {
            conn.execute_batch(DROP_SCHEMA)?;
        }
        conn.execute_batch(SCHEMA)?;
        info!(force, "schema initialized");
        Ok(())
    }

    /// Writes a complete user record, replacing any previous data for that id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] on failure; nothing is written then.
    pub fn import_user(&self, record: &UserRecord) -> Result<(), StoreError> {
        let mut conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let tx = conn.transaction()?;
        let p = &record.profile;

        tx.execute(
            "INSERT INTO users (id, name, email, phone, location, date_of_birth) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
             ON CONFLICT(id) DO UPDATE SET name = excluded.name, email = excluded.email, \
             phone = excluded.phone, location = excluded.location, \
             date_of_birth = excluded.date_of_birth",
            params![
                record.user_id,
                p.name,
                p.email,
                p.phone,
                p.location,
                p.date_of_birth
            ],
        )?;
        tx.execute(
            "INSERT INTO job_settings (user_id, target_role, current_ctc, expected_ctc, \
             notice_period, years_of_experience, availability) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
             ON CONFLICT(user_id) DO UPDATE SET target_role = excluded.target_role, \
             current_ctc = excluded.current_ctc, expected_ctc = excluded.expected_ctc, \
             notice_period = excluded.notice_period, \
             years_of_experience = excluded.years_of_experience, \
             availability = excluded.availability",
            params![
                record.user_id,
                p.target_role,
                p.current_ctc,
                p.expected_ctc,
                p.notice_period,
                p.years_of_experience,
                p.availability
            ],
        )?;

        tx.execute(
            "DELETE FROM skills WHERE user_id = ?1",
            params![record.user_id],
        )?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO skills (user_id, name, display_name, rating, rating_scale, \
                 years_of_experience) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for skill in &record.skills {
                stmt.execute(params![
                    record.user_id,
                    skill.name,
                    skill.display_name,
                    skill.rating,
                    skill.rating_scale,
                    skill.years_of_experience
                ])?;
            }
        }

        tx.execute(
            "INSERT INTO resumes (user_id, content, updated_at) VALUES (?1, ?2, ?3) \
             ON CONFLICT(user_id) DO UPDATE SET content = excluded.content, \
             updated_at = excluded.updated_at",
            params![
                record.user_id,
                record.resume,
                chrono::Utc::now().to_rfc3339()
            ],
        )?;

        tx.commit()?;
        info!(
            user_id = %record.user_id,
            skills = record.skills.len(),
            "user imported"
        );
        Ok(())
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().unwrap_or_else(PoisonError::into_inner);
            f(&guard)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn load_profile(&self, user_id: &str) -> Result<Profile, StoreError> {
        let user_id = user_id.to_string();
        self.with_conn(move |conn| {
            debug!(user_id = %user_id, "loading profile");
            conn.query_row(PROFILE_QUERY, params![user_id], |row| {
                Ok(Profile {
                    name: row.get(0)?,
                    email: row.get(1)?,
                    phone: row.get(2)?,
                    location: row.get(3)?,
                    date_of_birth: row.get(4)?,
                    target_role: row.get(5)?,
                    current_ctc: row.get(6)?,
                    expected_ctc: row.get(7)?,
                    notice_period: row.get(8)?,
                    years_of_experience: row.get(9)?,
                    availability: row.get(10)?,
                })
            })
            .optional()?
            .ok_or(StoreError::UserNotFound { user_id })
        })
        .await
    }

    async fn load_skills(&self, user_id: &str) -> Result<Vec<Skill>, StoreError> {
        let user_id = user_id.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT name, display_name, rating, rating_scale, years_of_experience \
                 FROM skills WHERE user_id = ?1 ORDER BY id",
            )?;
            let skills = stmt
                .query_map(params![user_id], |row| {
                    Ok(Skill {
                        name: row.get(0)?,
                        display_name: row.get(1)?,
                        rating: row.get(2)?,
                        rating_scale: row.get(3)?,
                        years_of_experience: row.get(4)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(skills)
        })
        .await
    }

    async fn load_resume(&self, user_id: &str) -> Result<String, StoreError> {
        let user_id = user_id.to_string();
        self.with_conn(move |conn| {
            let content: Option<String> = conn
                .query_row(
                    "SELECT content FROM resumes WHERE user_id = ?1",
                    params![user_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(content.unwrap_or_default())
        })
        .await
    }
}
