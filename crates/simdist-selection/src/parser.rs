//! Selection grammar parser using nom
//!
//! Grammar:
//! ```text
//! expr      := or_expr
//! or_expr   := and_expr ('||' and_expr)*
//! and_expr  := not_expr ('&&' not_expr)*
//! not_expr  := '!' not_expr | atom
//! atom      := '(' expr ')' | 'all' | 'none' | comparison
//! comparison:= value op value
//! op        := '<' | '<=' | '>' | '>=' | '==' | '!='
//! value     := function | number | field
//! function  := ident '(' args ')'
//! ```

use crate::ast::*;
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, multispace0, satisfy},
    combinator::{map, not, peek, recognize, value},
    multi::{many0, separated_list0},
    number::complete::double,
    sequence::{delimited, pair, preceded, terminated},
    IResult,
};
use thiserror::Error;

/// Parse errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unexpected characters at end of expression: '{0}'")]
    Trailing(String),
}

/// Parse a selection expression from a string
///
/// An empty string selects everything.
pub fn parse_selection(input: &str) -> Result<SelectionExpr, ParseError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(SelectionExpr::All);
    }

    match expr(input) {
        Ok(("", result)) => Ok(result),
        Ok((remaining, _)) => Err(ParseError::Trailing(remaining.to_string())),
        Err(e) => Err(ParseError::Parse(format!("{:?}", e))),
    }
}

/// Parse whitespace
fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

/// Parse an expression (entry point)
fn expr(input: &str) -> IResult<&str, SelectionExpr> {
    or_expr(input)
}

/// Parse OR expressions
fn or_expr(input: &str) -> IResult<&str, SelectionExpr> {
    let (input, first) = and_expr(input)?;
    let (input, rest) = many0(preceded(ws(tag("||")), and_expr))(input)?;

    let result = rest.into_iter().fold(first, SelectionExpr::or);
    Ok((input, result))
}

/// Parse AND expressions
fn and_expr(input: &str) -> IResult<&str, SelectionExpr> {
    let (input, first) = not_expr(input)?;
    let (input, rest) = many0(preceded(ws(tag("&&")), not_expr))(input)?;

    let result = rest.into_iter().fold(first, SelectionExpr::and);
    Ok((input, result))
}

/// Parse NOT expressions
fn not_expr(input: &str) -> IResult<&str, SelectionExpr> {
    alt((
        map(preceded(ws(char('!')), not_expr), SelectionExpr::not),
        atom,
    ))(input)
}

/// Parse atomic expressions
fn atom(input: &str) -> IResult<&str, SelectionExpr> {
    ws(alt((
        delimited(char('('), expr, char(')')),
        value(SelectionExpr::All, keyword("all")),
        value(SelectionExpr::None, keyword("none")),
        map(comparison, SelectionExpr::Comparison),
    )))(input)
}

/// Match a keyword that is not the prefix of a longer identifier
fn keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    terminated(
        tag(word),
        not(peek(satisfy(|c: char| c.is_alphanumeric() || c == '_'))),
    )
}

/// Parse a comparison
fn comparison(input: &str) -> IResult<&str, Comparison> {
    let (input, lhs) = parse_value(input)?;
    let (input, op) = ws(comparison_op)(input)?;
    let (input, rhs) = parse_value(input)?;
    Ok((input, Comparison::new(lhs, op, rhs)))
}

/// Parse a comparison operator
fn comparison_op(input: &str) -> IResult<&str, ComparisonOp> {
    alt((
        value(ComparisonOp::Le, tag("<=")),
        value(ComparisonOp::Ge, tag(">=")),
        value(ComparisonOp::Eq, tag("==")),
        value(ComparisonOp::Ne, tag("!=")),
        value(ComparisonOp::Lt, tag("<")),
        value(ComparisonOp::Gt, tag(">")),
    ))(input)
}

/// Parse a value
fn parse_value(input: &str) -> IResult<&str, Value> {
    ws(alt((
        map(function_call, Value::Function),
        // Numbers before identifiers so "1e-3" is not read as a field
        map(parse_number, Value::Number),
        map(identifier, |s| Value::Field(s.to_string())),
    )))(input)
}

/// Parse a number (including scientific notation)
///
/// `double` on its own also accepts "inf" and "nan", which would shadow
/// field names starting with those letters.
fn parse_number(input: &str) -> IResult<&str, f64> {
    preceded(
        peek(satisfy(|c: char| c.is_ascii_digit() || matches!(c, '.' | '-' | '+'))),
        double,
    )(input)
}

/// Parse an identifier (starts with letter or underscore, followed by alphanumeric or underscore)
fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_alphabetic() || c == '_'),
        take_while(|c: char| c.is_alphanumeric() || c == '_'),
    ))(input)
}

/// Parse a function call
fn function_call(input: &str) -> IResult<&str, FunctionCall> {
    let (input, name) = identifier(input)?;
    let (input, _) = multispace0(input)?;
    let (input, args) = delimited(
        char('('),
        separated_list0(ws(char(',')), parse_value),
        char(')'),
    )(input)?;

    Ok((input, FunctionCall::new(name, args)))
}
