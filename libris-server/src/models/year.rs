//! Publication year for bookshelf entries

use super::ValidationError;

const MIN_YEAR: i64 = 0;
const MAX_YEAR: i64 = 9999;

/// Validated publication year
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PublicationYear(i32);

impl PublicationYear {
    pub fn new(year: i64) -> Result<Self, ValidationError> {
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(ValidationError::OutOfRange {
                field: "publication_year",
                min: MIN_YEAR,
                max: MAX_YEAR,
            });
        }
        Ok(Self(year as i32))
    }

    pub fn get(self) -> i32 {
        self.0
    }
}
