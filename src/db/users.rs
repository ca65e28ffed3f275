use crate::db::models::User;
use crate::db::password::{hash_password, verify_password};
use crate::db::UserRepository;
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use tokio::task::spawn_blocking;

/// [`UserRepository`] backed by the `users` table
#[derive(Clone)]
pub struct SqliteUsers {
    pool: SqlitePool,
}

impl SqliteUsers {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn hashed_password(&self, id: i64) -> AppResult<Option<String>> {
        let hash = sqlx::query_scalar::<_, String>("SELECT hashed_password FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(hash)
    }
}

/// Argon2 is deliberately slow; keep it off the async workers.
async fn hash_blocking(password: &str) -> AppResult<String> {
    let password = password.to_owned();
    spawn_blocking(move || hash_password(&password)).await?
}

async fn verify_blocking(password: &str, hash: String) -> AppResult<bool> {
    let password = password.to_owned();
    spawn_blocking(move || verify_password(&password, &hash)).await?
}

#[async_trait]
impl UserRepository for SqliteUsers {
    async fn insert(&self, name: &str, email: &str, password: &str) -> AppResult<()> {
        let hash = hash_blocking(password).await?;

        sqlx::query(
            "INSERT INTO users (name, email, hashed_password, created)
             VALUES (?, ?, ?, ?)",
        )
        .bind(name)
        .bind(email)
        .bind(hash)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            // users_uc_email is the only unique constraint on the table
            sqlx::Error::Database(ref db) if db.is_unique_violation() => AppError::DuplicateEmail,
            _ => AppError::Database(e),
        })?;

        Ok(())
    }

    async fn authenticate(&self, email: &str, password: &str) -> AppResult<i64> {
        let row = sqlx::query_as::<_, (i64, String)>(
            "SELECT id, hashed_password FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        let Some((id, hash)) = row else {
            return Err(AppError::InvalidCredentials);
        };

        if verify_blocking(password, hash).await? {
            Ok(id)
        } else {
            Err(AppError::InvalidCredentials)
        }
    }

    async fn exists(&self, id: i64) -> AppResult<bool> {
        // SQLite has no boolean type; EXISTS yields 0 or 1
        let exists = sqlx::query_scalar::<_, i64>("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists != 0)
    }

    async fn get(&self, id: i64) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "SELECT id, name, email, hashed_password, created FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {}", id)))
    }

    async fn update_password(
        &self,
        id: i64,
        current_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        let Some(current_hash) = self.hashed_password(id).await? else {
            return Err(AppError::InvalidCredentials);
        };

        if !verify_blocking(current_password, current_hash).await? {
            return Err(AppError::InvalidCredentials);
        }

        let new_hash = hash_blocking(new_password).await?;

        sqlx::query("UPDATE users SET hashed_password = ? WHERE id = ?")
            .bind(new_hash)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    async fn repo_with_alice() -> (SqliteUsers, i64) {
        let repo = SqliteUsers::new(test_pool().await);
        repo.insert("Alice", "alice@example.com", "pa$$word1").await.unwrap();
        let id = repo
            .authenticate("alice@example.com", "pa$$word1")
            .await
            .unwrap();
        (repo, id)
    }

    #[tokio::test]
    async fn exists_reports_only_real_users() {
        let (repo, id) = repo_with_alice().await;

        assert!(repo.exists(id).await.unwrap());
        assert!(!repo.exists(0).await.unwrap());
        assert!(!repo.exists(id + 1).await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_emails_are_rejected() {
        let (repo, _) = repo_with_alice().await;

        let err = repo
            .insert("Other Alice", "alice@example.com", "different1")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateEmail));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let (repo, _) = repo_with_alice().await;

        assert!(matches!(
            repo.authenticate("alice@example.com", "wrong").await,
            Err(AppError::InvalidCredentials)
        ));
        assert!(matches!(
            repo.authenticate("nobody@example.com", "pa$$word1").await,
            Err(AppError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn password_update_requires_the_current_password() {
        let (repo, id) = repo_with_alice().await;

        assert!(matches!(
            repo.update_password(id, "wrong", "new-password").await,
            Err(AppError::InvalidCredentials)
        ));

        repo.update_password(id, "pa$$word1", "new-password").await.unwrap();
        assert_eq!(
            repo.authenticate("alice@example.com", "new-password").await.unwrap(),
            id
        );
    }

    #[tokio::test]
    async fn get_returns_account_details() {
        let (repo, id) = repo_with_alice().await;

        let user = repo.get(id).await.unwrap();
        assert_eq!(user.name, "Alice");
        assert_eq!(user.email, "alice@example.com");
        assert!(matches!(repo.get(id + 100).await, Err(AppError::NotFound(_))));
    }
}
