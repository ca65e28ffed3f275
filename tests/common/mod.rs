//! Shared fixtures for the integration tests: counting mock repositories, an
//! app built on them with in-memory sessions, and a client that carries the
//! session cookie from one request to the next like a browser would.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use regex::Regex;
use snipit::config::Config;
use snipit::db::models::{Snippet, User};
use snipit::db::{SnippetRepository, UserRepository};
use snipit::error::{AppError, AppResult};
use snipit::routes;
use snipit::state::AppState;
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use tower_sessions::session::{Id, Record};
use tower_sessions::{MemoryStore, SessionStore};

pub const ALICE_EMAIL: &str = "alice@example.com";
pub const ALICE_PASSWORD: &str = "pa$$word1";
pub const SNIPPET_CONTENT: &str = "An old silent pond...";

/// Snippet 1 exists, 99 panics, 42 times out, everything else is missing
#[derive(Default)]
pub struct MockSnippets {
    pub gets: AtomicUsize,
    pub inserts: AtomicUsize,
    /// How long `latest` takes, to keep a home page request in flight
    pub latest_delay_ms: AtomicU64,
}

pub fn mock_snippet() -> Snippet {
    let now = Utc::now();
    Snippet {
        id: 1,
        title: "An old silent pond".to_string(),
        content: SNIPPET_CONTENT.to_string(),
        created: now,
        expires: now + Duration::days(7),
    }
}

#[async_trait]
impl SnippetRepository for MockSnippets {
    async fn insert(&self, _title: &str, _content: &str, _expires_days: i64) -> AppResult<i64> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        Ok(2)
    }

    async fn get(&self, id: i64) -> AppResult<Snippet> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        match id {
            1 => Ok(mock_snippet()),
            42 => Err(AppError::Database(sqlx::Error::PoolTimedOut)),
            99 => panic!("mock snippet store blew up"),
            _ => Err(AppError::NotFound(format!("snippet {}", id))),
        }
    }

    async fn latest(&self) -> AppResult<Vec<Snippet>> {
        let delay = self.latest_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
        }
        Ok(vec![mock_snippet()])
    }
}

/// Knows alice (id 1) until she is removed
pub struct MockUsers {
    existing: Mutex<HashSet<i64>>,
    pub inserts: AtomicUsize,
}

impl Default for MockUsers {
    fn default() -> Self {
        Self {
            existing: Mutex::new(HashSet::from([1])),
            inserts: AtomicUsize::new(0),
        }
    }
}

impl MockUsers {
    /// Delete an account behind the back of any session referring to it
    pub fn remove_user(&self, id: i64) {
        self.existing.lock().unwrap().remove(&id);
    }

    fn has(&self, id: i64) -> bool {
        self.existing.lock().unwrap().contains(&id)
    }
}

#[async_trait]
impl UserRepository for MockUsers {
    async fn insert(&self, _name: &str, email: &str, _password: &str) -> AppResult<()> {
        if email == "dupe@example.com" {
            return Err(AppError::DuplicateEmail);
        }
        self.inserts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn authenticate(&self, email: &str, password: &str) -> AppResult<i64> {
        if email == ALICE_EMAIL && password == ALICE_PASSWORD && self.has(1) {
            Ok(1)
        } else {
            Err(AppError::InvalidCredentials)
        }
    }

    async fn exists(&self, id: i64) -> AppResult<bool> {
        Ok(self.has(id))
    }

    async fn get(&self, id: i64) -> AppResult<User> {
        if !self.has(id) {
            return Err(AppError::NotFound(format!("user {}", id)));
        }
        Ok(User {
            id,
            name: "Alice".to_string(),
            email: ALICE_EMAIL.to_string(),
            hashed_password: String::new(),
            created: Utc::now(),
        })
    }

    async fn update_password(&self, id: i64, current: &str, _new: &str) -> AppResult<()> {
        if self.has(id) && current == ALICE_PASSWORD {
            Ok(())
        } else {
            Err(AppError::InvalidCredentials)
        }
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn location(&self) -> &str {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }

    /// Anti-forgery token embedded in the rendered page
    pub fn csrf_token(&self) -> String {
        let rx = Regex::new(r#"<input type="hidden" name="csrf_token" value="([^"]+)">"#).unwrap();
        rx.captures(&self.body)
            .map(|c| c[1].to_string())
            .expect("page embeds a csrf token")
    }
}

/// The app plus a single browser-like client
pub struct TestApp {
    pub router: Router,
    pub snippets: Arc<MockSnippets>,
    pub users: Arc<MockUsers>,
    /// The session store behind the app, shared by every client
    pub sessions: MemoryStore,
    /// `session=...` as last set by the server
    pub cookie: Option<String>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(Config {
            cookie_secure: false,
            ..Config::default()
        })
    }

    pub fn with_config(config: Config) -> Self {
        let snippets = Arc::new(MockSnippets::default());
        let users = Arc::new(MockUsers::default());
        let state = AppState::new(config, snippets.clone(), users.clone());
        let sessions = MemoryStore::default();

        TestApp {
            router: routes::app(state, sessions.clone()),
            snippets,
            users,
            sessions,
            cookie: None,
        }
    }

    /// A second client talking to the same server (same stores)
    pub fn other_client(&self) -> Self {
        TestApp {
            router: self.router.clone(),
            snippets: self.snippets.clone(),
            users: self.users.clone(),
            sessions: self.sessions.clone(),
            cookie: None,
        }
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, Body::empty(), None).await
    }

    pub async fn post_form(&mut self, uri: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        self.send(
            Method::POST,
            uri,
            Body::from(body),
            Some("application/x-www-form-urlencoded"),
        )
        .await
    }

    pub async fn send(
        &mut self,
        method: Method,
        uri: &str,
        body: Body,
        content_type: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        for value in response.headers().get_all(header::SET_COOKIE) {
            let value = value.to_str().unwrap();
            if value.starts_with("session=") {
                let pair = value.split(';').next().unwrap().to_string();
                self.cookie = Some(pair);
            }
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        TestResponse {
            status,
            headers,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }

    /// Log in as alice through the real login form
    pub async fn login(&mut self) -> TestResponse {
        let token = self.get("/user/login").await.csrf_token();
        let response = self
            .post_form(
                "/user/login",
                &[
                    ("email", ALICE_EMAIL),
                    ("password", ALICE_PASSWORD),
                    ("csrf_token", &token),
                ],
            )
            .await;
        assert_eq!(response.status, StatusCode::SEE_OTHER);
        response
    }

    /// Token for the current session, read from a page that embeds it
    pub async fn csrf_token(&mut self) -> String {
        self.get("/user/login").await.csrf_token()
    }

    /// The stored record for this client's cookie, if it is still live
    pub async fn session_record(&self) -> Option<Record> {
        let cookie = self.cookie.as_deref()?;
        let id = Id::from_str(cookie.strip_prefix("session=")?).ok()?;
        self.sessions.load(&id).await.unwrap()
    }

    /// Overwrite this client's stored record
    pub async fn save_session_record(&self, record: &Record) {
        self.sessions.save(record).await.unwrap();
    }

    pub fn snippet_gets(&self) -> usize {
        self.snippets.gets.load(Ordering::SeqCst)
    }

    pub fn snippet_inserts(&self) -> usize {
        self.snippets.inserts.load(Ordering::SeqCst)
    }
}
