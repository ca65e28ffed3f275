//! # Configuration Management
//!
//! Configuration is read from the environment once at startup and then carried
//! through the application inside [`AppState`](crate::state::AppState). Nothing
//! reads the environment after that point.
//!
//! ## Environment Variables
//! - `HOST`: Server bind address (default: 127.0.0.1)
//! - `PORT`: Server port (default: 4000)
//! - `DATABASE_URL`: SQLite connection string
//! - `DEBUG`: Send diagnostic text in 500 responses (default: false)
//! - `SESSION_LIFETIME_HOURS`: Idle timeout for sessions (default: 12)
//! - `COOKIE_SECURE`: Mark the session cookie `Secure` (default: true)
//! - `STATIC_DIR`: Directory served under `/static` (default: ./ui/static)
//! - `DB_ACQUIRE_TIMEOUT_SECS`: How long a query waits for a pooled connection (default: 5)

use anyhow::Result;
use std::env;
use std::time::Duration;

/// Application configuration
///
/// Built once by [`Config::from_env`] (or [`Config::default`] in tests) and
/// shared read-only by every request.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host/IP address to bind to
    pub host: String,

    /// Server port number
    pub port: u16,

    /// SQLite database connection URL
    /// Format: "sqlite:filename.db?mode=rwc" (read, write, create)
    pub database_url: String,

    /// Debug mode
    ///
    /// When enabled, 500 responses carry the underlying error or panic text
    /// instead of the generic status message. Never enable in production.
    pub debug: bool,

    /// Sessions lapse after this many hours without a request
    pub session_lifetime_hours: i64,

    /// Whether the session cookie is sent only over HTTPS
    pub cookie_secure: bool,

    /// Directory holding CSS and other static assets
    pub static_dir: String,

    /// Upper bound on waiting for a database connection
    pub db_acquire_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 4000,
            database_url: "sqlite:snipit.db?mode=rwc".to_string(),
            debug: false,
            session_lifetime_hours: 12,
            cookie_secure: true,
            static_dir: "./ui/static".to_string(),
            db_acquire_timeout: Duration::from_secs(5),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads variables from .env file (if present) using dotenvy
    /// 2. Reads each configuration value from environment
    /// 3. Falls back to the [`Default`] values for anything unset
    /// 4. Returns an error if a value is present but cannot be parsed
    ///
    /// ## Example .env file
    /// ```text
    /// HOST=127.0.0.1
    /// PORT=4000
    /// DATABASE_URL=sqlite:snipit.db?mode=rwc
    /// DEBUG=false
    /// COOKIE_SECURE=false
    /// ```
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists (dotenvy doesn't error if file missing)
        dotenvy::dotenv().ok();

        let defaults = Config::default();

        Ok(Config {
            host: env::var("HOST").unwrap_or(defaults.host),

            // The ? operator propagates parse errors for malformed values
            port: match env::var("PORT") {
                Ok(port) => port.parse()?,
                Err(_) => defaults.port,
            },

            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),

            debug: match env::var("DEBUG") {
                Ok(flag) => parse_flag(&flag)?,
                Err(_) => defaults.debug,
            },

            session_lifetime_hours: match env::var("SESSION_LIFETIME_HOURS") {
                Ok(hours) => hours.parse()?,
                Err(_) => defaults.session_lifetime_hours,
            },

            // Local development over plain http needs this off, otherwise the
            // browser drops the cookie and every form fails CSRF validation
            cookie_secure: match env::var("COOKIE_SECURE") {
                Ok(flag) => parse_flag(&flag)?,
                Err(_) => defaults.cookie_secure,
            },

            static_dir: env::var("STATIC_DIR").unwrap_or(defaults.static_dir),

            db_acquire_timeout: match env::var("DB_ACQUIRE_TIMEOUT_SECS") {
                Ok(secs) => Duration::from_secs(secs.parse()?),
                Err(_) => defaults.db_acquire_timeout,
            },
        })
    }

    /// Get the socket address to bind the server to
    ///
    /// Example: "127.0.0.1:4000"
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Accepts the usual spellings of a boolean environment flag.
fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => anyhow::bail!("invalid boolean flag value: {other:?}"),
    }
}
