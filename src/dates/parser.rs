//! Relative-date expression parser
//!
//! # Supported Syntax
//!
//! ```text
//! (date "YYYY-M-D")
//! (today)
//! (yearstart X)   (yearend X)
//! (monthstart X)  (monthend X)
//! (deltadays X n) (deltaweeks X n) (deltamonths X n) (deltayears X n)
//! ```
//!
//! `X` is any nested expression, `n` a signed integer. Whitespace between
//! tokens is free.

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit1, multispace0, multispace1, one_of},
    combinator::{map, map_opt, map_res, opt, recognize, value},
    sequence::{delimited, pair, preceded, tuple},
    IResult,
};

use crate::dates::ast::{DateExpr, DeltaUnit};
use crate::error::{ReshapeError, ReshapeResult};
use chrono::NaiveDate;

/// Parse an expression string into a [`DateExpr`]
pub fn parse_expression(input: &str) -> ReshapeResult<DateExpr> {
    let input = input.trim();

    match parse_expr(input) {
        Ok((remaining, expr)) => {
            if remaining.trim().is_empty() {
                Ok(expr)
            } else {
                Err(ReshapeError::MalformedExpression(format!(
                    "Unexpected input after expression: '{}'",
                    remaining.trim()
                )))
            }
        }
        Err(e) => Err(ReshapeError::MalformedExpression(format!(
            "Parse error in '{}': {:?}",
            input, e
        ))),
    }
}

/// Parse one parenthesised expression
fn parse_expr(input: &str) -> IResult<&str, DateExpr> {
    delimited(
        pair(char('('), multispace0),
        alt((
            parse_literal,
            parse_today,
            parse_unary,
            parse_delta,
        )),
        pair(multispace0, char(')')),
    )(input)
}

/// Parse `date "YYYY-M-D"`
fn parse_literal(input: &str) -> IResult<&str, DateExpr> {
    let (input, _) = tag("date")(input)?;
    let (input, _) = multispace1(input)?;
    let (input, date) = alt((
        delimited(char('"'), parse_ymd, char('"')),
        delimited(char('\''), parse_ymd, char('\'')),
    ))(input)?;
    Ok((input, DateExpr::Literal(date)))
}

/// Parse `YYYY-M-D` into a valid calendar date
fn parse_ymd(input: &str) -> IResult<&str, NaiveDate> {
    map_opt(
        tuple((
            map_res(digit1, str::parse::<i32>),
            preceded(char('-'), map_res(digit1, str::parse::<u32>)),
            preceded(char('-'), map_res(digit1, str::parse::<u32>)),
        )),
        |(year, month, day)| NaiveDate::from_ymd_opt(year, month, day),
    )(input)
}

/// Parse `today`
fn parse_today(input: &str) -> IResult<&str, DateExpr> {
    value(DateExpr::Today, tag("today"))(input)
}

/// Parse the one-argument operators
fn parse_unary(input: &str) -> IResult<&str, DateExpr> {
    let (input, op) = alt((
        tag("yearstart"),
        tag("yearend"),
        tag("monthstart"),
        tag("monthend"),
    ))(input)?;
    let (input, _) = multispace0(input)?;
    let (input, inner) = parse_expr(input)?;

    let inner = Box::new(inner);
    let expr = match op {
        "yearstart" => DateExpr::YearStart(inner),
        "yearend" => DateExpr::YearEnd(inner),
        "monthstart" => DateExpr::MonthStart(inner),
        _ => DateExpr::MonthEnd(inner),
    };
    Ok((input, expr))
}

/// Parse `deltaX <expr> <n>`
fn parse_delta(input: &str) -> IResult<&str, DateExpr> {
    let (input, unit) = parse_delta_unit(input)?;
    let (input, _) = multispace0(input)?;
    let (input, base) = parse_expr(input)?;
    let (input, _) = multispace1(input)?;
    let (input, amount) = parse_signed(input)?;

    Ok((
        input,
        DateExpr::Delta {
            base: Box::new(base),
            unit,
            amount,
        },
    ))
}

fn parse_delta_unit(input: &str) -> IResult<&str, DeltaUnit> {
    alt((
        value(DeltaUnit::Days, tag("deltadays")),
        value(DeltaUnit::Weeks, tag("deltaweeks")),
        value(DeltaUnit::Months, tag("deltamonths")),
        value(DeltaUnit::Years, tag("deltayears")),
    ))(input)
}

/// Parse an optionally signed integer
fn parse_signed(input: &str) -> IResult<&str, i64> {
    map_res(
        map(recognize(pair(opt(one_of("+-")), digit1)), |s: &str| {
            s.trim_start_matches('+')
        }),
        str::parse::<i64>,
    )(input)
}
