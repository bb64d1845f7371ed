//! Filter type definitions
//!
//! Defines the conditions, sort terms and pagination a listing query is built
//! from, plus the compiled clause handed to the executor.

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

use super::error::FilterError;

/// A single bindable value
///
/// Deserializes from any JSON scalar. Integers must fit in `i64`; larger ones
/// are rejected rather than widened to `Real`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for SqlValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(SqlValueVisitor)
    }
}

struct SqlValueVisitor;

impl<'de> Visitor<'de> for SqlValueVisitor {
    type Value = SqlValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON scalar")
    }

    fn visit_unit<E: de::Error>(self) -> Result<SqlValue, E> {
        Ok(SqlValue::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<SqlValue, E> {
        Ok(SqlValue::Null)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<SqlValue, E> {
        Ok(SqlValue::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<SqlValue, E> {
        Ok(SqlValue::Integer(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<SqlValue, E> {
        i64::try_from(v)
            .map(SqlValue::Integer)
            .map_err(|_| E::custom(format!("integer {} is out of range for i64", v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<SqlValue, E> {
        Ok(SqlValue::Real(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<SqlValue, E> {
        Ok(SqlValue::Text(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<SqlValue, E> {
        Ok(SqlValue::Text(v))
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Value attached to a condition: one scalar or a list of scalars
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Scalar(SqlValue),
    List(Vec<SqlValue>),
}

impl FilterValue {
    pub fn scalar(value: impl Into<SqlValue>) -> Self {
        Self::Scalar(value.into())
    }

    pub fn list<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        Self::List(values.into_iter().map(Into::into).collect())
    }

    pub fn pair(first: impl Into<SqlValue>, second: impl Into<SqlValue>) -> Self {
        Self::List(vec![first.into(), second.into()])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equal,
    Or,
    Range,
    In,
    IsNull,
    Not,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operator::Equal => "Equal",
            Operator::Or => "Or",
            Operator::Range => "Range",
            Operator::In => "In",
            Operator::IsNull => "IsNull",
            Operator::Not => "Not",
        };
        f.write_str(name)
    }
}

/// A condition value viewed through the shape its operator requires
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CheckedValue<'a> {
    Single(&'a SqlValue),
    Pair(&'a SqlValue, &'a SqlValue),
    Many(&'a [SqlValue]),
    Flag(bool),
}

/// One condition ANDed into the WHERE clause
///
/// `field` is interpolated into SQL verbatim. It must come from a
/// server-controlled allow-list (see [`super::parse_filter`]), never from raw
/// user input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterField {
    field: String,
    operator: Operator,
    value: FilterValue,
}

impl FilterField {
    /// Build a condition, rejecting values whose shape does not fit the operator
    pub fn new(
        field: impl Into<String>,
        operator: Operator,
        value: FilterValue,
    ) -> Result<Self, FilterError> {
        let condition = Self {
            field: field.into(),
            operator,
            value,
        };
        condition.validate()?;
        Ok(condition)
    }

    pub fn equal(field: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self {
            field: field.into(),
            operator: Operator::Equal,
            value: FilterValue::scalar(value),
        }
    }

    pub fn not(field: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self {
            field: field.into(),
            operator: Operator::Not,
            value: FilterValue::scalar(value),
        }
    }

    pub fn is_null(field: impl Into<String>, is_null: bool) -> Self {
        Self {
            field: field.into(),
            operator: Operator::IsNull,
            value: FilterValue::scalar(is_null),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn value(&self) -> &FilterValue {
        &self.value
    }

    /// Check both the value shape and, for `Or`, the field layout
    pub fn validate(&self) -> Result<(), FilterError> {
        self.checked_value()?;
        if self.operator == Operator::Or {
            self.or_columns()?;
        }
        Ok(())
    }

    /// View the value in the shape the operator requires
    pub fn checked_value(&self) -> Result<CheckedValue<'_>, FilterError> {
        let invalid = || FilterError::invalid_value(self.operator);
        match (self.operator, &self.value) {
            (Operator::Equal | Operator::Not, FilterValue::Scalar(v)) => Ok(CheckedValue::Single(v)),
            (Operator::Or | Operator::Range, FilterValue::List(values)) => match values.as_slice() {
                [first, second] => Ok(CheckedValue::Pair(first, second)),
                _ => Err(invalid()),
            },
            (Operator::In, FilterValue::List(values)) => Ok(CheckedValue::Many(values)),
            (Operator::IsNull, FilterValue::Scalar(SqlValue::Bool(flag))) => {
                Ok(CheckedValue::Flag(*flag))
            }
            _ => Err(invalid()),
        }
    }

    /// Split an `Or` field (`"a,b"`) into its two column names
    pub fn or_columns(&self) -> Result<(&str, &str), FilterError> {
        let mut parts = self.field.split(',').map(str::trim);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(left), Some(right), None) if !left.is_empty() && !right.is_empty() => {
                Ok((left, right))
            }
            _ => Err(FilterError::InvalidOrField {
                field: self.field.clone(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortCondition {
    /// Coalesce NULLs before comparing
    #[serde(rename = "ifnull")]
    IfNull,
}

/// One ORDER BY term
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Sort {
    pub field: String,
    #[serde(default)]
    pub order: SortOrder,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<SortCondition>,
}

impl Sort {
    pub fn new(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            field: field.into(),
            order,
            condition: None,
        }
    }

    pub fn null_safe(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            field: field.into(),
            order,
            condition: Some(SortCondition::IfNull),
        }
    }

    pub fn is_null_safe(&self) -> bool {
        self.condition == Some(SortCondition::IfNull)
    }
}

/// Page request. `page` is 1-based with 0 meaning unset; `page_size` 0 means no limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
}

impl Pagination {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }
    }

    pub fn limit(&self) -> Option<u32> {
        (self.page_size > 0).then_some(self.page_size)
    }

    /// Row offset, only meaningful when both page and page size are set
    pub fn offset(&self) -> Option<u64> {
        if self.page_size == 0 || self.page == 0 {
            return None;
        }
        Some(u64::from(self.page - 1) * u64::from(self.page_size))
    }
}

/// Conditions, sort terms and page request for one listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Filter {
    pub fields: Vec<FilterField>,
    pub sorts: Vec<Sort>,
    pub pagination: Pagination,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, field: FilterField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sorts.push(sort);
        self
    }

    pub fn with_pagination(mut self, page: u32, page_size: u32) -> Self {
        self.pagination = Pagination::new(page, page_size);
        self
    }
}

/// Statement tail plus the positional arguments for its `?` placeholders
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompiledClause {
    pub sql: String,
    pub args: Vec<SqlValue>,
}

impl CompiledClause {
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    pub fn placeholder_count(&self) -> usize {
        self.sql.matches('?').count()
    }
}
