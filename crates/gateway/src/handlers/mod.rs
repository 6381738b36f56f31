//! API handlers module

pub mod accounts;
pub mod admin;
pub mod articles;
pub mod comments;
pub mod follows;
pub mod health;
pub mod interactions;
pub mod messages;
