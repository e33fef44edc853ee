//! Tag list parsing for post forms

use libris_core::slugify;

use super::ValidationError;

/// Maximum length of a single tag name
const MAX_TAG_LEN: usize = 100;

/// Deduplicated, sorted tag names parsed from form input
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagList(Vec<String>);

impl TagList {
    /// Parse a tag string.
    ///
    /// Comma-separated when the input contains a comma, otherwise
    /// whitespace-separated. Names are trimmed, blanks dropped, duplicates
    /// removed (case-sensitive), and the result sorted.
    ///
    /// # Example
    /// ```
    /// use libris_server::models::TagList;
    ///
    /// let tags = TagList::parse("web dev, rust,  web dev").unwrap();
    /// assert_eq!(tags.names(), ["rust", "web dev"]);
    ///
    /// let tags = TagList::parse("rust axum").unwrap();
    /// assert_eq!(tags.names(), ["axum", "rust"]);
    /// ```
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let parts: Vec<&str> = if input.contains(',') {
            input.split(',').collect()
        } else {
            input.split_whitespace().collect()
        };
        Self::from_names(parts)
    }

    /// Build from already separated names (JSON array input).
    pub fn from_names<I, S>(names: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list: Vec<String> = Vec::new();
        for raw in names {
            let name = raw.as_ref().trim();
            if name.is_empty() {
                continue;
            }
            if name.chars().count() > MAX_TAG_LEN {
                return Err(ValidationError::TooLong {
                    field: "tags",
                    max: MAX_TAG_LEN,
                });
            }
            list.push(name.to_owned());
        }

        list.sort();
        list.dedup();
        Ok(Self(list))
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Name paired with its base slug (before collision suffixes).
    pub fn with_slugs(&self) -> impl Iterator<Item = (&str, String)> + '_ {
        self.0.iter().map(|n| (n.as_str(), slugify(n)))
    }
}
