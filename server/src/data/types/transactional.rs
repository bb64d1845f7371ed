//! Row types for the transactional store

use serde::{Deserialize, Serialize};

// ============================================================================
// User types
// ============================================================================

/// User row from database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub address: Option<String>,
    pub education: Option<String>,
    pub created_at: i64,
}

/// Input for creating a user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub address: Option<String>,
    pub education: Option<String>,
}

impl NewUser {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_education(mut self, education: impl Into<String>) -> Self {
        self.education = Some(education.into());
        self
    }
}

/// One row of a filtered user listing
///
/// `filter_count` is the number of rows matching the conditions, ignoring
/// LIMIT/OFFSET.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListUserRow {
    pub name: String,
    pub address: Option<String>,
    pub education: Option<String>,
    pub filter_count: i64,
}
