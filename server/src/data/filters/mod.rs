//! Query filter system
//!
//! Compiles declarative filters (conditions, sort terms, pagination) into a
//! parameterized SQL statement tail. Conditions support equality, inequality,
//! two-column OR, ranges, IN lists and NULL checks.
//!
//! ## Usage
//!
//! ```
//! use userquery_server::data::filters::{Filter, FilterField, Sort, SortOrder, compile};
//!
//! let filter = Filter::new()
//!     .with_field(FilterField::equal("name", "Alice"))
//!     .with_sort(Sort::new("created_at", SortOrder::Desc))
//!     .with_pagination(2, 10);
//! let clause = compile(&filter).unwrap();
//! assert_eq!(clause.sql, " WHERE name = ? ORDER BY created_at desc LIMIT 10 OFFSET 10");
//! ```

pub mod columns;
mod compiler;
mod error;
mod parser;
mod types;

pub use compiler::{CompilerConfig, FilterCompiler, compile};
pub use error::FilterError;
pub use parser::parse_filter;
pub use types::{
    CheckedValue, CompiledClause, Filter, FilterField, FilterValue, Operator, Pagination, Sort,
    SortCondition, SortOrder, SqlValue,
};
