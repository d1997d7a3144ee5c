//! Email identifiers.
//!
//! Emails double as document keys, so besides the usual shape check they must
//! not contain `/` (a path separator in most document stores).

use crate::error::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@/]+@[^\s@/]+\.[^\s@/]+$").expect("email pattern is a valid regex")
});

/// Checks that `email` is usable as a user key.
///
/// Surrounding whitespace is not trimmed: `" a@x.com"` is a different key
/// than `"a@x.com"` and is rejected rather than silently normalized.
pub fn validate_email(email: &str) -> Result<&str, ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::EmptyEmail);
    }
    if !EMAIL_PATTERN.is_match(email) {
        return Err(ValidationError::MalformedEmail(email.to_string()));
    }
    Ok(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_plain_addresses() {
        assert_eq!(validate_email("alice@x.com"), Ok("alice@x.com"));
        assert!(validate_email("first.last+tag@mail.example.org").is_ok());
    }

    #[test]
    fn test_rejects_empty() {
        assert_eq!(validate_email(""), Err(ValidationError::EmptyEmail));
    }

    #[test]
    fn test_rejects_malformed() {
        for bad in ["alice", "alice@", "@x.com", "a b@x.com", "a/b@x.com", " a@x.com"] {
            assert_eq!(
                validate_email(bad),
                Err(ValidationError::MalformedEmail(bad.to_string())),
                "{bad} should be rejected"
            );
        }
    }
}
