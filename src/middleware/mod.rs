//! # Middleware Module
//!
//! Request interceptors. Each one either passes the request on (possibly
//! after publishing something into the
//! [`RequestContext`](crate::context::RequestContext)) or short-circuits
//! with a response of its own.
//!
//! ## Order
//! Every request:
//! 1. `headers`: security headers on whatever response comes back
//! 2. trailing-slash normalization (tower-http, wired in `routes`)
//! 3. `logging`: one span per request
//! 4. `recover`: panics become a 500 with `Connection: close`
//!
//! Interactive routes additionally:
//! 5. `session_lock`: one request at a time per session cookie
//! 6. session load/save (tower-sessions, wired in `routes`)
//! 7. `csrf`: token check on unsafe methods
//! 8. `auth::authenticate`: publishes who is logged in
//!
//! Then, per route:
//! - `resource`: loads the snippet named in the path
//! - `auth::require_auth`: sends anonymous visitors to the login page

pub mod auth;
pub mod csrf;
pub mod headers;
pub mod logging;
pub mod recover;
pub mod resource;
pub mod session_lock;
