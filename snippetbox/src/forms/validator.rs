//! Field validation rules and error accumulation
//!
//! Rule functions are pure predicates over a single value. A [`Validator`]
//! collects the messages for the rules that failed so a form can be
//! re-rendered with every problem shown next to the offending field.
//!
//! # Example
//!
//! ```rust
//! use snippetbox::forms::validator::{max_chars, not_blank, Validator};
//!
//! let title = "";
//! let mut v = Validator::new();
//! v.check_field(not_blank(title), "title", "This field cannot be blank");
//! v.check_field(max_chars(title, 100), "title", "Too long");
//!
//! assert!(!v.valid());
//! assert_eq!(v.field_error("title"), Some("This field cannot be blank"));
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

/// Pattern accepted for e-mail addresses
///
/// Follows the shape browsers use for `<input type="email">`.
pub static EMAIL_RX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("e-mail pattern is a valid regex")
});

/// Accumulated validation failures for one form submission
///
/// Field errors are keyed by form field name. Only the first failure recorded
/// for a field is kept, so rules should be checked from most to least basic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validator {
    field_errors: BTreeMap<String, String>,
    non_field_errors: Vec<String>,
}

impl Validator {
    /// Create an empty validator
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no errors of either kind have been recorded
    #[must_use]
    pub fn valid(&self) -> bool {
        self.field_errors.is_empty() && self.non_field_errors.is_empty()
    }

    /// Record `message` against `field` unless it already has an error
    pub fn add_field_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.field_errors
            .entry(field.into())
            .or_insert_with(|| message.into());
    }

    /// Record an error that is not tied to a single field
    pub fn add_non_field_error(&mut self, message: impl Into<String>) {
        self.non_field_errors.push(message.into());
    }

    /// Record `message` against `field` when `ok` is false
    pub fn check_field(&mut self, ok: bool, field: impl Into<String>, message: impl Into<String>) {
        if !ok {
            self.add_field_error(field, message);
        }
    }

    /// The error recorded for `field`, if any
    #[must_use]
    pub fn field_error(&self, field: &str) -> Option<&str> {
        self.field_errors.get(field).map(String::as_str)
    }

    /// All field errors, ordered by field name
    #[must_use]
    pub const fn field_errors(&self) -> &BTreeMap<String, String> {
        &self.field_errors
    }

    /// Non-field errors in the order they were recorded
    #[must_use]
    pub fn non_field_errors(&self) -> &[String] {
        &self.non_field_errors
    }
}

/// True when `value` contains something other than whitespace
#[must_use]
pub fn not_blank(value: &str) -> bool {
    !value.trim().is_empty()
}

/// True when `value` has at most `n` characters
#[must_use]
pub fn max_chars(value: &str, n: usize) -> bool {
    value.chars().count() <= n
}

/// True when `value` has at least `n` characters
#[must_use]
pub fn min_chars(value: &str, n: usize) -> bool {
    value.chars().count() >= n
}

/// True when `value` matches `rx`
#[must_use]
pub fn matches(value: &str, rx: &Regex) -> bool {
    rx.is_match(value)
}

/// True when `value` equals one of `permitted`
#[must_use]
pub fn permitted_value<T: PartialEq>(value: &T, permitted: &[T]) -> bool {
    permitted.contains(value)
}
