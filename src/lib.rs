//! # Snipit
//!
//! A small web application for sharing short-lived text snippets, gated
//! behind signup and login.
//!
//! The interesting part is the request pipeline assembled in [`routes::app`]:
//! security headers, path normalization, logging, panic recovery, CSRF
//! protection, session-backed authentication, per-route resource loading and
//! the authorization guard.

pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod session;
pub mod state;
pub mod templates;
pub mod validator;
