//! Account input: usernames, emails, passwords, and the registration form

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use super::{FormErrors, ValidationError};

const MAX_USERNAME_LEN: usize = 150;
const MAX_EMAIL_LEN: usize = 254;
const MIN_PASSWORD_LEN: usize = 8;

/// Frequently leaked passwords of acceptable length, compared lowercased
const COMMON_PASSWORDS: &[&str] = &[
    "password", "password1", "passw0rd", "iloveyou", "sunshine", "princess",
    "football", "baseball", "superman", "starwars", "trustno1", "letmein1",
    "welcome1", "qwerty123", "qwertyuiop", "abc12345", "1q2w3e4r", "1qaz2wsx",
    "zaq12wsx", "dragon12", "monkey12", "master12", "whatever", "computer",
    "internet", "corvette", "mercedes", "michelle", "jennifer", "asdfghjkl",
];

/// Letters, digits and @/./+/-/_ only
static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.@+-]+$").expect("invalid username regex"));

/// Deliberately loose: one @, no whitespace, a dot in the domain
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("invalid email regex"));

/// Validated username
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    /// Create a username.
    ///
    /// # Example
    /// ```
    /// use libris_server::models::Username;
    ///
    /// assert!(Username::new("alice.smith+books@home").is_ok());
    /// assert!(Username::new("alice smith").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if s.is_empty() {
            return Err(ValidationError::Empty { field: "username" });
        }

        if s.chars().count() > MAX_USERNAME_LEN {
            return Err(ValidationError::TooLong {
                field: "username",
                max: MAX_USERNAME_LEN,
            });
        }

        if !USERNAME_RE.is_match(s) {
            return Err(ValidationError::InvalidFormat {
                field: "username",
                reason: "may contain only letters, numbers, and @/./+/-/_ characters",
            });
        }

        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Validated email address with a lowercased domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email(String);

impl Email {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: "email" });
        }

        if trimmed.len() > MAX_EMAIL_LEN {
            return Err(ValidationError::TooLong {
                field: "email",
                max: MAX_EMAIL_LEN,
            });
        }

        if !EMAIL_RE.is_match(trimmed) {
            return Err(ValidationError::InvalidFormat {
                field: "email",
                reason: "enter a valid email address",
            });
        }

        // The regex guarantees exactly one '@'
        let (local, domain) = trimmed.split_once('@').unwrap_or((trimmed, ""));
        Ok(Self(format!("{}@{}", local, domain.to_lowercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A password that passed the strength rules. Never printed.
#[derive(Clone)]
pub struct Password(String);

impl Password {
    /// Check a new password entered twice.
    ///
    /// # Rules
    /// - Both entries identical
    /// - At least 8 characters
    /// - Not entirely numeric
    /// - Not the same as the username (case-insensitive)
    /// - Not a commonly used password
    pub fn new(password1: &str, password2: &str, username: &str) -> Result<Self, ValidationError> {
        if password1.is_empty() {
            return Err(ValidationError::Empty { field: "password1" });
        }

        if password1 != password2 {
            return Err(ValidationError::Rejected {
                field: "password2",
                reason: "the two password fields didn't match",
            });
        }

        if password1.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::Rejected {
                field: "password2",
                reason: "this password is too short, it must contain at least 8 characters",
            });
        }

        if password1.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::Rejected {
                field: "password2",
                reason: "this password is entirely numeric",
            });
        }

        if password1.eq_ignore_ascii_case(username) {
            return Err(ValidationError::Rejected {
                field: "password2",
                reason: "the password is too similar to the username",
            });
        }

        if COMMON_PASSWORDS.contains(&password1.to_lowercase().as_str()) {
            return Err(ValidationError::Rejected {
                field: "password2",
                reason: "this password is too common",
            });
        }

        Ok(Self(password1.to_owned()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

/// Whether the registration form asks for an email address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailPolicy {
    Required,
    Optional,
}

/// A registration submission that passed every field check
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: Username,
    pub email: Option<Email>,
    pub password: Password,
}

impl Registration {
    /// Validate every field, reporting all failures together.
    pub fn validate(
        username: &str,
        email: Option<&str>,
        password1: &str,
        password2: &str,
        policy: EmailPolicy,
    ) -> Result<Self, FormErrors> {
        let username_result = Username::new(username);
        let email_result = match (email.map(str::trim).filter(|e| !e.is_empty()), policy) {
            (Some(raw), _) => Email::new(raw).map(Some),
            (None, EmailPolicy::Required) => Err(ValidationError::Empty { field: "email" }),
            (None, EmailPolicy::Optional) => Ok(None),
        };
        let password_result = Password::new(password1, password2, username);

        match (username_result, email_result, password_result) {
            (Ok(username), Ok(email), Ok(password)) => Ok(Self {
                username,
                email,
                password,
            }),
            (u, e, p) => Err(FormErrors::collect([u.err(), e.err(), p.err()])),
        }
    }
}
