//! Column allow-lists for listings

pub const USER_FILTERABLE: &[&str] = &["name", "address", "education", "created_at"];

pub const USER_SORTABLE: &[&str] = &["name", "address", "education", "created_at"];
