//! Route handlers organized by resource

pub mod accounts;
pub mod api;
pub mod catalog;
pub mod comments;
pub mod health;
pub mod posts;
pub mod shelf;
