//! Shared data types

mod transactional;

pub use transactional::{ListUserRow, NewUser, UserRow};
