//! Validation error types

use std::fmt;

/// Field name used for errors that don't belong to a single input
pub const NON_FIELD: &str = "non_field_errors";

/// Validation error for domain models
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Field is empty when it shouldn't be
    Empty { field: &'static str },

    /// Field exceeds maximum length
    TooLong { field: &'static str, max: usize },

    /// String doesn't match required format (e.g., username charset)
    InvalidFormat { field: &'static str, reason: &'static str },

    /// Number outside the accepted range
    OutOfRange { field: &'static str, min: i64, max: i64 },

    /// Value collides with an existing record
    Duplicate { resource: &'static str, field: &'static str },

    /// Input is well-formed but refused (password mismatch, bad credentials)
    Rejected { field: &'static str, reason: &'static str },
}

impl ValidationError {
    /// Name of the input field this error is attached to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Empty { field }
            | Self::TooLong { field, .. }
            | Self::InvalidFormat { field, .. }
            | Self::OutOfRange { field, .. }
            | Self::Duplicate { field, .. }
            | Self::Rejected { field, .. } => field,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{} cannot be empty", field),
            Self::TooLong { field, max } => {
                write!(f, "{} exceeds maximum length of {} characters", field, max)
            }
            Self::InvalidFormat { field, reason } => {
                write!(f, "{}: {}", field, reason)
            }
            Self::OutOfRange { field, min, max } => {
                write!(f, "{} must be between {} and {}", field, min, max)
            }
            Self::Duplicate { resource, field } => {
                write!(f, "a {} with that {} already exists", resource, field)
            }
            Self::Rejected { reason, .. } => f.write_str(reason),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Check a trimmed string against emptiness and a character limit.
pub(crate) fn bounded(
    field: &'static str,
    raw: &str,
    max: usize,
) -> Result<String, ValidationError> {
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }

    if trimmed.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }

    Ok(trimmed.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ValidationError::TooLong {
            field: "title",
            max: 200,
        };
        assert_eq!(
            err.to_string(),
            "title exceeds maximum length of 200 characters"
        );

        let err = ValidationError::Duplicate {
            resource: "user",
            field: "username",
        };
        assert_eq!(err.to_string(), "a user with that username already exists");
    }

    #[test]
    fn field_accessor() {
        let err = ValidationError::Rejected {
            field: NON_FIELD,
            reason: "nope",
        };
        assert_eq!(err.field(), "non_field_errors");
        assert_eq!(err.to_string(), "nope");
    }

    #[test]
    fn bounded_counts_chars_not_bytes() {
        // 100 two-byte characters fit in a 100 char limit
        let s = "é".repeat(100);
        assert!(bounded("name", &s, 100).is_ok());
        assert!(bounded("name", &"é".repeat(101), 100).is_err());
    }
}
