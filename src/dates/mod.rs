//! Relative-date resolution
//!
//! Turns small s-expressions such as `(deltadays (today) -30)` into concrete
//! dates used to bound chart windows.
//!
//! - **ast**: expression tree and evaluation
//! - **parser**: nom grammar
//!
//! Anything that is not an s-expression (absent, blank, or not starting with
//! `(`) leaves the bound open.

pub mod ast;
pub mod parser;

pub use ast::{DateExpr, DeltaUnit};
pub use parser::parse_expression;

use crate::error::{ReshapeError, ReshapeResult};
use chrono::{NaiveDate, Utc};

/// A resolved window bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBound {
    Date(NaiveDate),
    Unbounded,
}

impl DateBound {
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(date) => Some(*date),
            Self::Unbounded => None,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, Self::Unbounded)
    }
}

/// Resolve `expression` against an explicit `today`
pub fn evaluate_at(expression: Option<&str>, today: NaiveDate) -> ReshapeResult<DateBound> {
    let Some(text) = expression.map(str::trim) else {
        return Ok(DateBound::Unbounded);
    };
    if !text.starts_with('(') {
        return Ok(DateBound::Unbounded);
    }

    let date = parse_expression(text)?.eval(today)?;
    tracing::debug!(expression = text, %date, "Resolved relative date");
    Ok(DateBound::Date(date))
}

/// Resolve `expression` against the current UTC date
pub fn evaluate(expression: Option<&str>) -> ReshapeResult<DateBound> {
    evaluate_at(expression, Utc::now().date_naive())
}

/// Resolve `expression`, failing when it leaves the bound open
pub fn evaluate_not_none(expression: Option<&str>) -> ReshapeResult<NaiveDate> {
    evaluate(expression)?
        .date()
        .ok_or_else(|| ReshapeError::UnboundedDate(expression.unwrap_or_default().to_string()))
}
