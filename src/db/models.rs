//! # Database Models
//!
//! Rows of the `snippets` and `users` tables. Timestamps are stored as UTC text
//! and decoded into `DateTime<Utc>` by sqlx's chrono support.

use chrono::{DateTime, Utc};

/// Format used everywhere a timestamp is shown to a person.
const HUMAN_DATE: &str = "%d %b %Y at %H:%M";

/// A short-lived text snippet
///
/// ## Derive Macros
/// - `sqlx::FromRow`: maps `SELECT id, title, content, created, expires` rows
/// - `Clone`: the resource loader hands a copy to the request context
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Snippet {
    /// Positive row id, also the path segment in `/snippets/{id}`
    pub id: i64,

    pub title: String,

    pub content: String,

    /// When the snippet was created
    pub created: DateTime<Utc>,

    /// After this instant the snippet is treated as if it never existed
    pub expires: DateTime<Utc>,
}

impl Snippet {
    /// Creation time, formatted for display (e.g. "15 Jan 2024 at 10:30")
    pub fn created_display(&self) -> String {
        self.created.format(HUMAN_DATE).to_string()
    }

    /// Expiry time, formatted for display
    pub fn expires_display(&self) -> String {
        self.expires.format(HUMAN_DATE).to_string()
    }
}

/// User account information
///
/// The password hash is an argon2 PHC string. It is never rendered and never
/// leaves the `users` repository except for verification.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,

    /// Display name chosen at signup
    pub name: String,

    /// Unique login email
    pub email: String,

    pub hashed_password: String,

    /// When the account was created
    pub created: DateTime<Utc>,
}

impl User {
    /// Signup time, formatted for display
    pub fn created_display(&self) -> String {
        self.created.format(HUMAN_DATE).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn dates_render_in_human_format() {
        let created = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        let snippet = Snippet {
            id: 1,
            title: "t".into(),
            content: "c".into(),
            created,
            expires: created + chrono::Duration::days(7),
        };

        assert_eq!(snippet.created_display(), "15 Jan 2024 at 10:30");
        assert_eq!(snippet.expires_display(), "22 Jan 2024 at 10:30");
    }
}
