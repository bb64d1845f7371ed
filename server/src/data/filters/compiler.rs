//! Filter compiler
//!
//! Turns a [`Filter`] into a statement tail (` WHERE ... ORDER BY ... LIMIT ... OFFSET ...`)
//! with `?` placeholders and the matching positional arguments.
//!
//! Only column names and fixed keywords are written into the SQL text; every
//! condition value is bound through a placeholder. Column names are NOT
//! escaped, so callers must only pass names taken from a server-controlled
//! allow-list.

use crate::core::constants::{DEFAULT_MAX_PAGE_SIZE, DEFAULT_NULL_SAFE_FUNCTION};

use super::error::FilterError;
use super::types::{CheckedValue, CompiledClause, Filter, FilterField, Operator, SqlValue};

/// Compiler options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerConfig {
    /// Function wrapped around null-safe sort columns
    pub null_safe_function: String,
    /// Largest accepted page size (0 disables the check)
    pub max_page_size: u32,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            null_safe_function: DEFAULT_NULL_SAFE_FUNCTION.to_string(),
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }
}

/// Stateless filter-to-SQL compiler
#[derive(Debug, Clone, Default)]
pub struct FilterCompiler {
    config: CompilerConfig,
}

/// Compile with the default configuration
pub fn compile(filter: &Filter) -> Result<CompiledClause, FilterError> {
    FilterCompiler::default().compile(filter)
}

impl FilterCompiler {
    pub fn new(config: CompilerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compile a filter into clause text and arguments
    ///
    /// Stops at the first invalid condition; nothing is returned for the
    /// remaining fields in that case.
    pub fn compile(&self, filter: &Filter) -> Result<CompiledClause, FilterError> {
        let mut clause = CompiledClause::default();

        if !filter.fields.is_empty() {
            let mut conditions = Vec::with_capacity(filter.fields.len());
            for field in &filter.fields {
                conditions.push(build_condition(field, &mut clause.args)?);
            }
            clause.sql.push_str(" WHERE ");
            clause.sql.push_str(&conditions.join(" AND "));
        }

        if !filter.sorts.is_empty() {
            clause.sql.push_str(&self.build_order_by(filter));
        }

        clause.sql.push_str(&self.build_pagination(filter)?);

        tracing::trace!(sql = %clause.sql, args = clause.args.len(), "Compiled filter");
        Ok(clause)
    }

    fn build_order_by(&self, filter: &Filter) -> String {
        let mut null_safe = false;
        let terms: Vec<String> = filter
            .sorts
            .iter()
            .map(|sort| {
                if sort.is_null_safe() {
                    null_safe = true;
                    sort.field.clone()
                } else {
                    format!("{} {}", sort.field, sort.order)
                }
            })
            .collect();

        if null_safe {
            // Direction of the wrapped expression comes from the first term
            let order = filter.sorts[0].order;
            format!(
                " ORDER BY {}({}) {}",
                self.config.null_safe_function,
                terms.join(","),
                order
            )
        } else {
            format!(" ORDER BY {}", terms.join(","))
        }
    }

    fn build_pagination(&self, filter: &Filter) -> Result<String, FilterError> {
        let pagination = filter.pagination;
        let Some(limit) = pagination.limit() else {
            return Ok(String::new());
        };

        let max = self.config.max_page_size;
        if max > 0 && limit > max {
            return Err(FilterError::PageSizeTooLarge {
                page_size: limit,
                max,
            });
        }

        Ok(match pagination.offset() {
            Some(offset) => format!(" LIMIT {} OFFSET {}", limit, offset),
            None => format!(" LIMIT {}", limit),
        })
    }
}

/// Render one condition and push its arguments
fn build_condition(field: &FilterField, args: &mut Vec<SqlValue>) -> Result<String, FilterError> {
    let column = field.field();
    let sql = match (field.operator(), field.checked_value()?) {
        (Operator::Equal, CheckedValue::Single(value)) => {
            args.push(value.clone());
            format!("{} = ?", column)
        }
        (Operator::Not, CheckedValue::Single(value)) => {
            args.push(value.clone());
            format!("{} != ?", column)
        }
        (Operator::Or, CheckedValue::Pair(first, second)) => {
            let (left, right) = field.or_columns()?;
            args.push(first.clone());
            args.push(second.clone());
            format!("({} = ? OR {} = ?)", left, right)
        }
        (Operator::Range, CheckedValue::Pair(low, high)) => {
            args.push(low.clone());
            args.push(high.clone());
            format!("{} BETWEEN ? AND ?", column)
        }
        // `IN ()` is not valid on every engine
        (Operator::In, CheckedValue::Many([])) => "1 = 0".to_string(),
        (Operator::In, CheckedValue::Many(values)) => {
            let placeholders = vec!["?"; values.len()].join(",");
            args.extend(values.iter().cloned());
            format!("{} IN ({})", column, placeholders)
        }
        (Operator::IsNull, CheckedValue::Flag(true)) => format!("{} IS NULL", column),
        (Operator::IsNull, CheckedValue::Flag(false)) => format!("{} IS NOT NULL", column),
        (operator, _) => return Err(FilterError::invalid_value(operator)),
    };
    Ok(sql)
}
