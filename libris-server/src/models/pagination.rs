//! Pagination types

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// Maximum items per page
const MAX_PER_PAGE: u32 = 100;

/// Fixed page size of the blog list views
pub const POSTS_PER_PAGE: u32 = 5;

/// Pagination parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Page number (1-indexed)
    pub page: u32,
    /// Items per page (max 100)
    pub per_page: u32,
}

impl Pagination {
    /// Create pagination with validation.
    ///
    /// - Page is clamped to minimum of 1
    /// - Per page is clamped to 1..=100
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    /// Calculate SQL OFFSET value.
    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.per_page as u64
    }

    /// Get LIMIT value.
    pub fn limit(&self) -> u32 {
        self.per_page
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(1, POSTS_PER_PAGE)
    }
}

/// Paginated response wrapper
#[derive(Debug, Clone, PartialEq)]
pub struct Paginated<T> {
    /// Items for current page
    pub items: Vec<T>,
    /// Total count across all pages
    pub total: i64,
    /// Current page number
    pub page: u32,
    /// Items per page
    pub per_page: u32,
}

impl<T> Paginated<T> {
    /// Calculate total number of pages.
    pub fn total_pages(&self) -> u32 {
        if self.total <= 0 {
            1
        } else {
            (self.total as u64).div_ceil(self.per_page as u64).max(1) as u32
        }
    }

    /// Check if there's a next page.
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    /// Check if there's a previous page.
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// Page 1 always exists, even when empty. Any later page must hold items.
    pub fn page_exists(&self) -> bool {
        self.page == 1 || !self.items.is_empty()
    }
}

impl<T: Serialize> Serialize for Paginated<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Paginated", 7)?;
        state.serialize_field("items", &self.items)?;
        state.serialize_field("total", &self.total)?;
        state.serialize_field("page", &self.page)?;
        state.serialize_field("per_page", &self.per_page)?;
        state.serialize_field("total_pages", &self.total_pages())?;
        state.serialize_field("has_next", &self.has_next())?;
        state.serialize_field("has_prev", &self.has_prev())?;
        state.end()
    }
}

/// Page selected by a `?page=` query value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRequest {
    Number(u32),
    /// `?page=last`
    Last,
}

impl PageRequest {
    /// Parse the raw query value. Absent or empty selects page 1.
    ///
    /// `None` when the value names no page: not a number, zero, or negative.
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        match raw.map(str::trim) {
            None | Some("") => Some(Self::Number(1)),
            Some("last") => Some(Self::Last),
            Some(s) => s.parse::<u32>().ok().filter(|n| *n >= 1).map(Self::Number),
        }
    }
}
