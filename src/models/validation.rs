use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Payload-level checks run before a record reaches a repository.
pub trait Validate {
    fn validate(&self) -> Vec<FieldError>;
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("Invalid regex pattern defined in code")
    })
}

#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    email.len() <= 255 && email_regex().is_match(email)
}

/// Accumulates field errors so a response can report all of them at once.
#[derive(Debug, Default)]
pub struct Checks {
    errors: Vec<FieldError>,
}

impl Checks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn required(self, field: &str, value: &str) -> Self {
        self.check(field, !value.trim().is_empty(), "is required")
    }

    /// For patch payloads: absent is fine, present-but-blank is not.
    #[must_use]
    pub fn not_blank(self, field: &str, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.required(field, v),
            None => self,
        }
    }

    #[must_use]
    pub fn max_len(self, field: &str, value: Option<&str>, max: usize) -> Self {
        let ok = value.is_none_or(|v| v.chars().count() <= max);
        self.check(field, ok, format!("must be at most {max} characters"))
    }

    #[must_use]
    pub fn email(self, field: &str, value: &str) -> Self {
        self.check(field, is_valid_email(value), "must be a valid email address")
    }

    #[must_use]
    pub fn check(mut self, field: &str, ok: bool, message: impl Into<String>) -> Self {
        if !ok {
            self.errors.push(FieldError::new(field, message));
        }
        self
    }

    #[must_use]
    pub fn finish(self) -> Vec<FieldError> {
        self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("student@college.example"));
        assert!(is_valid_email("  padded@college.example "));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("two@@college.example"));
        assert!(!is_valid_email("missing@tld"));
    }

    #[test]
    fn test_checks_collect_every_error() {
        let errors = Checks::new()
            .required("title", " ")
            .not_blank("category", Some(""))
            .not_blank("duration", None)
            .email("email", "nope")
            .finish();

        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["title", "category", "email"]);
    }
}
