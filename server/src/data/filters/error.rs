//! Filter error types

use thiserror::Error;

use super::types::Operator;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// The value attached to a condition does not have the shape its operator needs
    #[error("invalid value type for operator {operator}")]
    InvalidOperatorValue { operator: Operator },

    /// An `Or` condition whose field is not of the form `a,b`
    #[error("invalid field for operator Or: {field:?} (expected two comma-separated columns)")]
    InvalidOrField { field: String },

    #[error("page size {page_size} exceeds maximum of {max}")]
    PageSizeTooLarge { page_size: u32, max: u32 },

    #[error("filter JSON exceeds maximum size of {max} bytes")]
    FilterJsonTooLarge { max: usize },

    #[error("invalid filter JSON: {0}")]
    InvalidFilterJson(String),

    #[error("maximum {max} filter conditions allowed")]
    TooManyFilters { max: usize },

    #[error("maximum {max} sort terms allowed")]
    TooManySorts { max: usize },

    /// Null-safe ordering needs two or more terms, all marked `ifnull`
    #[error("null-safe sort requires at least two terms, all marked ifnull")]
    InvalidNullSafeSort,

    #[error("cannot {usage} by column: {column}")]
    ColumnNotAllowed { usage: &'static str, column: String },
}

impl FilterError {
    pub fn invalid_value(operator: Operator) -> Self {
        Self::InvalidOperatorValue { operator }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_value_display() {
        let err = FilterError::invalid_value(Operator::Or);
        assert_eq!(err.to_string(), "invalid value type for operator Or");

        let err = FilterError::invalid_value(Operator::IsNull);
        assert_eq!(err.to_string(), "invalid value type for operator IsNull");
    }

    #[test]
    fn test_column_not_allowed_display() {
        let err = FilterError::ColumnNotAllowed {
            usage: "sort",
            column: "password".to_string(),
        };
        assert_eq!(err.to_string(), "cannot sort by column: password");
    }

    #[test]
    fn test_invalid_null_safe_sort_display() {
        assert_eq!(
            FilterError::InvalidNullSafeSort.to_string(),
            "null-safe sort requires at least two terms, all marked ifnull"
        );
    }

    #[test]
    fn test_page_size_display() {
        let err = FilterError::PageSizeTooLarge {
            page_size: 1000,
            max: 500,
        };
        assert_eq!(err.to_string(), "page size 1000 exceeds maximum of 500");
    }
}
