//! Named base queries
//!
//! A listing is a base `SELECT` from this catalog followed by a compiled
//! filter clause. The catalog is plain configuration and is passed to the
//! repositories explicitly.

use std::collections::HashMap;

use super::error::SqliteError;
use crate::core::constants::QUERY_LIST_USERS;

/// Base query for user listings
///
/// `filter_count` is a window count, so it reports every row matching the
/// WHERE clause even when LIMIT/OFFSET trim the result.
pub const LIST_USERS_SQL: &str =
    "SELECT name, address, education, COUNT(*) OVER () AS filter_count FROM users";

#[derive(Debug, Clone)]
pub struct BaseQueries {
    queries: HashMap<String, String>,
}

impl Default for BaseQueries {
    fn default() -> Self {
        Self::empty().with_query(QUERY_LIST_USERS, LIST_USERS_SQL)
    }
}

impl BaseQueries {
    /// Catalog without any queries
    pub fn empty() -> Self {
        Self {
            queries: HashMap::new(),
        }
    }

    /// Register (or replace) a named query
    pub fn with_query(mut self, name: impl Into<String>, sql: impl Into<String>) -> Self {
        self.queries.insert(name.into(), sql.into());
        self
    }

    pub fn get(&self, name: &str) -> Result<&str, SqliteError> {
        self.queries
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| SqliteError::UnknownQuery(name.to_string()))
    }
}
