//! # Database Module
//!
//! The rest of the application only ever talks to the two repository traits
//! defined here. The SQLite implementations live in the submodules:
//! - `models`: Row types (Snippet, User)
//! - `snippets`: [`SnippetRepository`] over SQLite
//! - `users`: [`UserRepository`] over SQLite
//! - `password`: argon2 hashing used by `users`
//!
//! ## Why traits?
//! The request pipeline treats the data layer as an external collaborator.
//! Handlers and interceptors hold `Arc<dyn ...Repository>` so tests can swap
//! in counting mocks without a database.

pub mod models;
pub mod password;
pub mod snippets;
pub mod users;

use crate::config::Config;
use crate::error::AppResult;
use anyhow::Result;
use async_trait::async_trait;
use models::{Snippet, User};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

/// Snippet storage
#[async_trait]
pub trait SnippetRepository: Send + Sync {
    /// Store a new snippet that expires `expires_days` from now; returns its id
    async fn insert(&self, title: &str, content: &str, expires_days: i64) -> AppResult<i64>;

    /// Fetch an unexpired snippet
    ///
    /// # Errors
    /// `AppError::NotFound` if no unexpired snippet has this id.
    async fn get(&self, id: i64) -> AppResult<Snippet>;

    /// The ten most recently created unexpired snippets, newest first
    async fn latest(&self) -> AppResult<Vec<Snippet>>;
}

/// User account storage and credential checks
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create an account
    ///
    /// # Errors
    /// `AppError::DuplicateEmail` if the email is already registered.
    async fn insert(&self, name: &str, email: &str, password: &str) -> AppResult<()>;

    /// Verify an email/password pair and return the user id
    ///
    /// # Errors
    /// `AppError::InvalidCredentials` for an unknown email or a wrong password.
    async fn authenticate(&self, email: &str, password: &str) -> AppResult<i64>;

    /// Whether a user with this id still exists
    async fn exists(&self, id: i64) -> AppResult<bool>;

    /// Fetch a user by id
    async fn get(&self, id: i64) -> AppResult<User>;

    /// Replace the password after verifying the current one
    ///
    /// # Errors
    /// `AppError::InvalidCredentials` if `current_password` is wrong.
    async fn update_password(
        &self,
        id: i64,
        current_password: &str,
        new_password: &str,
    ) -> AppResult<()>;
}

/// Open the SQLite pool and bring the schema up to date
///
/// The acquire timeout bounds how long any query can wait for a connection,
/// so an exhausted pool surfaces as a 500 instead of a hung request.
pub async fn connect(config: &Config) -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .acquire_timeout(config.db_acquire_timeout)
        .connect(&config.database_url)
        .await?;

    // Embedded from ./migrations at compile time
    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// In-memory database with the schema applied, for repository tests.
#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    // One connection: every in-memory connection is its own database
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite opens");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations apply");
    pool
}
