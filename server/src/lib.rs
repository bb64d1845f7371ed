//! Filter-to-SQL compilation and filtered user listings over SQLite

mod app;
pub mod core;
pub mod data;
pub mod utils;
