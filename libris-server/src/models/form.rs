//! Collected field errors for a whole form submission

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::ValidationError;

/// Every field error from one submission, keyed by field name.
///
/// Forms validate all inputs before failing so the client can show every
/// problem at once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors {
    fields: BTreeMap<&'static str, Vec<String>>,
}

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the error half of several field results.
    pub fn collect<I>(errors: I) -> Self
    where
        I: IntoIterator<Item = Option<ValidationError>>,
    {
        let mut form = Self::new();
        for err in errors.into_iter().flatten() {
            form.push(err);
        }
        form
    }

    pub fn push(&mut self, err: ValidationError) {
        self.fields
            .entry(err.field())
            .or_default()
            .push(err.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Messages for one field, if any.
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.fields.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.keys().copied()
    }
}

impl From<ValidationError> for FormErrors {
    fn from(err: ValidationError) -> Self {
        let mut form = Self::new();
        form.push(err);
        form
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for messages in self.fields.values() {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                f.write_str(message)?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for FormErrors {}
