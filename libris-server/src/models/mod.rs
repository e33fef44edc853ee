//! Domain input types with validation at construction
//!
//! All user input is validated when creating these types.
//! Invalid input returns ValidationError (or FormErrors for whole forms),
//! not panic.

pub mod validation;
pub mod form;
pub mod text;
pub mod year;
pub mod account;
pub mod tags;
pub mod pagination;

pub use validation::{ValidationError, NON_FIELD};
pub use form::FormErrors;
pub use text::{Content, Name, ShelfAuthor, Title};
pub use year::PublicationYear;
pub use account::{Email, EmailPolicy, Password, Registration, Username};
pub use tags::TagList;
pub use pagination::{PageRequest, Paginated, Pagination, POSTS_PER_PAGE};
