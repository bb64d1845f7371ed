//! SQLite repositories
//!
//! Row types (UserRow, ListUserRow, etc.) live in `crate::data::types`.

pub mod user;

pub use user::{count_users, insert_user, list_users};
