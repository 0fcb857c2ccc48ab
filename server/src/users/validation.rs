//! Field validation for user accounts.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// A missing username or email.
pub const REQUIRED: &str = "cannot be blank";
/// A missing password, or a missing login field.
pub const BLANK: &str = "can't be blank";
pub const INVALID: &str = "is invalid";
pub const TAKEN: &str = "is already taken.";

/// Validation failures keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    /// A single failure.
    #[must_use]
    pub fn single(field: &str, message: &str) -> Self {
        let mut errors = Self::default();
        errors.insert(field, message);
        errors
    }

    /// Record a failure. The first message per field wins.
    pub fn insert(&mut self, field: &str, message: &str) {
        self.0
            .entry(field.to_string())
            .or_insert_with(|| message.to_string());
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

// Both patterns are literals and always compile.
#[allow(clippy::unwrap_used)]
static USERNAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9]+$").unwrap());

/// Unanchored: the address only has to contain a match.
#[allow(clippy::unwrap_used)]
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\S+@\S+\.\S+").unwrap());

/// Usernames are non-empty ASCII alphanumerics.
pub fn validate_username(username: &str) -> Result<(), &'static str> {
    if username.is_empty() {
        return Err(REQUIRED);
    }
    if !USERNAME_PATTERN.is_match(username) {
        return Err(INVALID);
    }
    Ok(())
}

/// Emails must contain `<non-space>@<non-space>.<non-space>` somewhere.
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.is_empty() {
        return Err(REQUIRED);
    }
    if !EMAIL_PATTERN.is_match(email) {
        return Err(INVALID);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_rules() {
        assert_eq!(validate_username("jake"), Ok(()));
        assert_eq!(validate_username("Jake42"), Ok(()));
        assert_eq!(validate_username(""), Err(REQUIRED));
        assert_eq!(validate_username("jake doe"), Err(INVALID));
        assert_eq!(validate_username("jake_doe"), Err(INVALID));
        assert_eq!(validate_username("jäke"), Err(INVALID));
    }

    #[test]
    fn test_email_rules() {
        assert_eq!(validate_email("jake@jake.jake"), Ok(()));
        assert_eq!(validate_email("a@b.c"), Ok(()));
        assert_eq!(validate_email("first.last@sub.example.org"), Ok(()));
        assert_eq!(validate_email(""), Err(REQUIRED));
        assert_eq!(validate_email("jake"), Err(INVALID));
        assert_eq!(validate_email("jake@example"), Err(INVALID));
        assert_eq!(validate_email("@example.com"), Err(INVALID));
        assert_eq!(validate_email("jake@.com"), Err(INVALID));
        assert_eq!(validate_email("jake@example."), Err(INVALID));
        assert_eq!(validate_email("jake @example.com"), Err(INVALID));
        assert_eq!(validate_email("jake@exa mple.com"), Err(INVALID));
    }

    #[test]
    fn test_email_match_may_be_surrounded() {
        assert_eq!(validate_email("a@b@c.d"), Ok(()));
        assert_eq!(validate_email("x y@b.c"), Ok(()));
        assert_eq!(validate_email("a@.b.c"), Ok(()));
        assert_eq!(validate_email("b.."), Err(INVALID));
        assert_eq!(validate_email("a@b. c"), Err(INVALID));
    }

    #[test]
    fn test_missing_field_messages_differ_by_source() {
        assert_eq!(REQUIRED, "cannot be blank");
        assert_eq!(BLANK, "can't be blank");
    }

    #[test]
    fn test_field_errors_first_message_wins() {
        let mut errors = FieldErrors::default();
        errors.insert("email", BLANK);
        errors.insert("email", TAKEN);

        assert_eq!(errors.get("email"), Some(BLANK));
        assert!(errors.into_result().is_err());
        assert_eq!(FieldErrors::default().into_result(), Ok(()));
    }

    #[test]
    fn test_field_errors_serialize_flat() {
        let errors = FieldErrors::single("email or password", INVALID);
        let json = serde_json::to_value(&errors).expect("serializable");

        assert_eq!(json, serde_json::json!({ "email or password": "is invalid" }));
    }
}
