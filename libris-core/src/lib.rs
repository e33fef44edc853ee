//! libris-core: configuration, errors, and slug helpers shared by the
//! libris server and CLI.

pub mod config;
pub mod error;
pub mod slug;

pub use config::LibrisConfig;
pub use error::{CoreError, Result};
pub use self::slug::{slug_base, slugify, unique_slug, FALLBACK_SLUG};
