//! SQLite error types

use thiserror::Error;

use crate::data::filters::FilterError;

#[derive(Error, Debug)]
pub enum SqliteError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The filter could not be compiled; no query was run
    #[error("Invalid filter: {0}")]
    Filter(#[from] FilterError),

    #[error("Unknown base query: {0}")]
    UnknownQuery(String),

    #[error("Migration {version} ({name}) failed: {error}")]
    MigrationFailed {
        version: i32,
        name: String,
        error: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
