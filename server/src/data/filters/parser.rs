//! Filter parsing
//!
//! Parses JSON filter documents into a [`Filter`] with validation. This is the
//! entry point for untrusted input: every column is checked against an
//! allow-list before it can reach the compiler.

use super::error::FilterError;
use super::types::{Filter, Sort};

/// Maximum size of filter JSON in bytes (64KB)
const MAX_FILTER_JSON_SIZE: usize = 64 * 1024;

/// Maximum number of conditions allowed
const MAX_FILTERS: usize = 50;

/// Maximum number of sort terms allowed
const MAX_SORTS: usize = 10;

/// Parse a filter from JSON
///
/// Validates JSON size, parses into a Filter, checks condition and sort
/// columns against their allow-lists and checks value shapes.
pub fn parse_filter(
    json_str: &str,
    filterable: &[&str],
    sortable: &[&str],
) -> Result<Filter, FilterError> {
    if json_str.len() > MAX_FILTER_JSON_SIZE {
        return Err(FilterError::FilterJsonTooLarge {
            max: MAX_FILTER_JSON_SIZE,
        });
    }

    let filter: Filter = serde_json::from_str(json_str)
        .map_err(|e| FilterError::InvalidFilterJson(e.to_string()))?;

    if filter.fields.len() > MAX_FILTERS {
        return Err(FilterError::TooManyFilters { max: MAX_FILTERS });
    }
    if filter.sorts.len() > MAX_SORTS {
        return Err(FilterError::TooManySorts { max: MAX_SORTS });
    }

    for condition in &filter.fields {
        condition.validate()?;
        if condition.operator() == super::Operator::Or {
            let (left, right) = condition.or_columns()?;
            ensure_allowed(left, filterable, "filter")?;
            ensure_allowed(right, filterable, "filter")?;
        } else {
            ensure_allowed(condition.field(), filterable, "filter")?;
        }
    }

    for sort in &filter.sorts {
        ensure_allowed(&sort.field, sortable, "sort")?;
    }
    ensure_null_safe_sorts(&filter.sorts)?;

    tracing::debug!(
        conditions = filter.fields.len(),
        sorts = filter.sorts.len(),
        "Parsed filter"
    );
    Ok(filter)
}

/// The null-coalescing wrapper takes the whole term list as its arguments,
/// so it only runs with two or more bare column terms.
fn ensure_null_safe_sorts(sorts: &[Sort]) -> Result<(), FilterError> {
    let null_safe = sorts.iter().filter(|s| s.is_null_safe()).count();
    if null_safe == 0 || (null_safe == sorts.len() && sorts.len() >= 2) {
        Ok(())
    } else {
        Err(FilterError::InvalidNullSafeSort)
    }
}

fn ensure_allowed(column: &str, allowed: &[&str], usage: &'static str) -> Result<(), FilterError> {
    if allowed.contains(&column) {
        Ok(())
    } else {
        Err(FilterError::ColumnNotAllowed {
            usage,
            column: column.to_string(),
        })
    }
}
