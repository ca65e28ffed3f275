//! # Application State
//!
//! Everything a handler or interceptor may need from outside the request:
//! configuration and the two data repositories. Built once at startup and
//! cloned into each request (every field is an `Arc`, so a clone is a few
//! pointer copies).

use crate::config::Config;
use crate::db::snippets::SqliteSnippets;
use crate::db::users::SqliteUsers;
use crate::db::{SnippetRepository, UserRepository};
use sqlx::sqlite::SqlitePool;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Read-only configuration, replaces any process-wide globals
    pub config: Arc<Config>,

    /// Snippet storage
    pub snippets: Arc<dyn SnippetRepository>,

    /// User storage and credential checks
    pub users: Arc<dyn UserRepository>,
}

impl AppState {
    /// Assemble state from already-built collaborators
    ///
    /// Tests use this directly with mock repositories.
    pub fn new(
        config: Config,
        snippets: Arc<dyn SnippetRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        AppState {
            config: Arc::new(config),
            snippets,
            users,
        }
    }

    /// State backed by the SQLite repositories sharing one pool
    pub fn from_pool(config: Config, pool: SqlitePool) -> Self {
        AppState::new(
            config,
            Arc::new(SqliteSnippets::new(pool.clone())),
            Arc::new(SqliteUsers::new(pool)),
        )
    }
}
