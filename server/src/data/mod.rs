//! Data storage layer
//!
//! - `filters` - Filter model and the filter-to-SQL compiler
//! - `sqlite` - Transactional database, base queries and repositories
//! - `types` - Row types shared by the repositories

pub mod filters;
pub mod sqlite;
pub mod types;

pub use sqlite::SqliteService;
