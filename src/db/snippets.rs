use crate::db::models::Snippet;
use crate::db::SnippetRepository;
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::SqlitePool;

/// [`SnippetRepository`] backed by the `snippets` table
#[derive(Clone)]
pub struct SqliteSnippets {
    pool: SqlitePool,
}

impl SqliteSnippets {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SnippetRepository for SqliteSnippets {
    async fn insert(&self, title: &str, content: &str, expires_days: i64) -> AppResult<i64> {
        let created = Utc::now();
        let expires = created + Duration::days(expires_days);

        let result = sqlx::query(
            "INSERT INTO snippets (title, content, created, expires)
             VALUES (?, ?, ?, ?)",
        )
        .bind(title)
        .bind(content)
        .bind(created)
        .bind(expires)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn get(&self, id: i64) -> AppResult<Snippet> {
        // julianday() compares instants, not strings
        sqlx::query_as::<_, Snippet>(
            "SELECT id, title, content, created, expires FROM snippets
             WHERE julianday(expires) > julianday('now') AND id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("snippet {}", id)))
    }

    async fn latest(&self) -> AppResult<Vec<Snippet>> {
        let snippets = sqlx::query_as::<_, Snippet>(
            "SELECT id, title, content, created, expires FROM snippets
             WHERE julianday(expires) > julianday('now')
             ORDER BY julianday(created) DESC, id DESC
             LIMIT 10",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(snippets)
    }
}
