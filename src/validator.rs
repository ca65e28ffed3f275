//! Field-level validation for submitted forms.
//!
//! A [`Validator`] is embedded in every form struct. Handlers run checks
//! against it, and on failure re-render the same form with a 422; templates
//! read the collected messages back through [`Validator::has_error`] and
//! [`Validator::field_error`].

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Pattern recommended by the WHATWG for `<input type="email">`
static EMAIL_RX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("email pattern compiles")
});

/// Collected validation failures for one form submission
#[derive(Clone, Debug, Default)]
pub struct Validator {
    field_errors: HashMap<String, String>,
    non_field_errors: Vec<String>,
}

impl Validator {
    /// True when no check has failed
    pub fn valid(&self) -> bool {
        self.field_errors.is_empty() && self.non_field_errors.is_empty()
    }

    /// Record an error for `key`; the first error per field wins
    pub fn add_field_error(&mut self, key: &str, message: &str) {
        self.field_errors
            .entry(key.to_string())
            .or_insert_with(|| message.to_string());
    }

    /// Record an error that belongs to the form as a whole
    pub fn add_non_field_error(&mut self, message: &str) {
        self.non_field_errors.push(message.to_string());
    }

    /// Record `message` against `key` unless `ok` holds
    pub fn check_field(&mut self, ok: bool, key: &str, message: &str) {
        if !ok {
            self.add_field_error(key, message);
        }
    }

    pub fn has_error(&self, key: &str) -> bool {
        self.field_errors.contains_key(key)
    }

    /// Message recorded for `key`, or "" if the field passed
    pub fn field_error(&self, key: &str) -> &str {
        self.field_errors.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn non_field_errors(&self) -> &[String] {
        &self.non_field_errors
    }
}

/// Not empty once surrounding whitespace is ignored
pub fn not_blank(value: &str) -> bool {
    !value.trim().is_empty()
}

/// At most `n` characters (not bytes)
pub fn max_chars(value: &str, n: usize) -> bool {
    value.chars().count() <= n
}

/// At least `n` characters (not bytes)
pub fn min_chars(value: &str, n: usize) -> bool {
    value.chars().count() >= n
}

pub fn permitted_value<T: PartialEq>(value: &T, permitted: &[T]) -> bool {
    permitted.contains(value)
}

/// Plausible email address
pub fn is_email(value: &str) -> bool {
    EMAIL_RX.is_match(value)
}
