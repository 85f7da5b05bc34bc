//! Relative-date expression tree

use crate::error::{ReshapeError, ReshapeResult};
use chrono::{Datelike, Duration, Months, NaiveDate};

/// Calendar unit of a shift
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaUnit {
    Days,
    Weeks,
    Months,
    Years,
}

impl DeltaUnit {
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Days => "deltadays",
            Self::Weeks => "deltaweeks",
            Self::Months => "deltamonths",
            Self::Years => "deltayears",
        }
    }
}

/// Parsed relative-date expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateExpr {
    /// `(date "YYYY-M-D")`
    Literal(NaiveDate),
    /// `(today)`
    Today,
    /// `(yearstart X)`
    YearStart(Box<DateExpr>),
    /// `(yearend X)`
    YearEnd(Box<DateExpr>),
    /// `(monthstart X)`
    MonthStart(Box<DateExpr>),
    /// `(monthend X)`
    MonthEnd(Box<DateExpr>),
    /// `(deltadays X n)` and friends
    Delta {
        base: Box<DateExpr>,
        unit: DeltaUnit,
        amount: i64,
    },
}

impl DateExpr {
    /// Resolve the expression, `today` standing in for `(today)`
    pub fn eval(&self, today: NaiveDate) -> ReshapeResult<NaiveDate> {
        let out_of_range =
            || ReshapeError::MalformedExpression(format!("date out of range in {:?}", self));

        match self {
            Self::Literal(date) => Ok(*date),
            Self::Today => Ok(today),
            Self::YearStart(inner) => {
                let date = inner.eval(today)?;
                NaiveDate::from_ymd_opt(date.year(), 1, 1).ok_or_else(out_of_range)
            }
            Self::YearEnd(inner) => {
                let date = inner.eval(today)?;
                NaiveDate::from_ymd_opt(date.year(), 12, 31).ok_or_else(out_of_range)
            }
            Self::MonthStart(inner) => inner.eval(today)?.with_day(1).ok_or_else(out_of_range),
            Self::MonthEnd(inner) => {
                let date = inner.eval(today)?;
                date.with_day(1)
                    .and_then(|first| first.checked_add_months(Months::new(1)))
                    .and_then(|next| next.pred_opt())
                    .ok_or_else(out_of_range)
            }
            Self::Delta { base, unit, amount } => {
                let date = base.eval(today)?;
                let shifted = match unit {
                    DeltaUnit::Days => {
                        Duration::try_days(*amount).and_then(|d| date.checked_add_signed(d))
                    }
                    DeltaUnit::Weeks => {
                        Duration::try_weeks(*amount).and_then(|d| date.checked_add_signed(d))
                    }
                    DeltaUnit::Months => shift_months(date, *amount),
                    DeltaUnit::Years => amount.checked_mul(12).and_then(|m| shift_months(date, m)),
                };
                shifted.ok_or_else(|| {
                    ReshapeError::MalformedExpression(format!(
                        "({} .. {}) leaves the calendar from {}",
                        unit.keyword(),
                        amount,
                        date
                    ))
                })
            }
        }
    }
}

/// Shift by whole months, clamping the day to the target month's length
fn shift_months(date: NaiveDate, months: i64) -> Option<NaiveDate> {
    let magnitude = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 {
        date.checked_add_months(magnitude)
    } else {
        date.checked_sub_months(magnitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn lit(y: i32, m: u32, d: u32) -> Box<DateExpr> {
        Box::new(DateExpr::Literal(date(y, m, d)))
    }

    #[test]
    fn test_month_arithmetic_clamps() {
        let expr = DateExpr::Delta {
            base: lit(2024, 1, 31),
            unit: DeltaUnit::Months,
            amount: 1,
        };
        assert_eq!(expr.eval(date(2000, 1, 1)).unwrap(), date(2024, 2, 29));

        let expr = DateExpr::Delta {
            base: lit(2024, 2, 29),
            unit: DeltaUnit::Years,
            amount: -1,
        };
        assert_eq!(expr.eval(date(2000, 1, 1)).unwrap(), date(2023, 2, 28));
    }

    #[test]
    fn test_month_bounds() {
        let today = date(2024, 2, 10);
        let start = DateExpr::MonthStart(Box::new(DateExpr::Today));
        let end = DateExpr::MonthEnd(Box::new(DateExpr::Today));
        assert_eq!(start.eval(today).unwrap(), date(2024, 2, 1));
        assert_eq!(end.eval(today).unwrap(), date(2024, 2, 29));
    }

    #[test]
    fn test_delta_overflow_names_operator() {
        let expr = DateExpr::Delta {
            base: lit(2024, 1, 1),
            unit: DeltaUnit::Days,
            amount: i64::MAX,
        };
        match expr.eval(date(2000, 1, 1)) {
            Err(ReshapeError::MalformedExpression(message)) => {
                assert!(message.contains("deltadays"))
            }
            other => panic!("expected an out-of-range error, got {:?}", other),
        }
    }

    #[test]
    fn test_weeks() {
        let expr = DateExpr::Delta {
            base: lit(2024, 1, 1),
            unit: DeltaUnit::Weeks,
            amount: -2,
        };
        assert_eq!(expr.eval(date(2000, 1, 1)).unwrap(), date(2023, 12, 18));
    }
}
