//! Operand coercion between value kinds.
//!
//! Errors never get created here for error inputs: an `Error` operand is
//! handed back unchanged so it stays sticky.

use std::cmp::Ordering;

use gridcalc_common::{ErrorCode, SpreadsheetVersion, Value, number_to_text};

use crate::locale::Locale;

pub fn to_number(value: &Value, locale: &Locale) -> Result<f64, ErrorCode> {
    match value {
        Value::Number(n) => Ok(*n),
        Value::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Blank => Ok(0.0),
        Value::Text(s) => locale.parse_number(s).ok_or(ErrorCode::ValueInvalid),
        Value::Error(e) => Err(*e),
        Value::Array(a) => to_number(a.top_left(), locale),
    }
}

/// Never fails; an error renders as its code text.
pub fn to_text(value: &Value) -> String {
    match value {
        Value::Text(s) => s.clone(),
        Value::Number(n) => number_to_text(*n),
        Value::Boolean(true) => "TRUE".to_string(),
        Value::Boolean(false) => "FALSE".to_string(),
        Value::Blank => String::new(),
        Value::Error(e) => e.to_string(),
        Value::Array(a) => to_text(a.top_left()),
    }
}

pub fn to_boolean(value: &Value) -> Result<bool, ErrorCode> {
    match value {
        Value::Boolean(b) => Ok(*b),
        Value::Number(n) => Ok(*n != 0.0),
        Value::Blank => Ok(false),
        Value::Text(s) => {
            let s = s.trim();
            if s.eq_ignore_ascii_case("TRUE") {
                Ok(true)
            } else if s.eq_ignore_ascii_case("FALSE") {
                Ok(false)
            } else {
                Err(ErrorCode::ValueInvalid)
            }
        }
        Value::Error(e) => Err(*e),
        Value::Array(a) => to_boolean(a.top_left()),
    }
}

/// NaN and infinities become `#NUM!`.
pub fn sanitize_numeric(n: f64) -> Result<f64, ErrorCode> {
    if n.is_finite() {
        Ok(n)
    } else {
        Err(ErrorCode::Num)
    }
}

/// Text longer than the format allows becomes `#VALUE!`.
pub fn check_text_length(s: String, version: &SpreadsheetVersion) -> Result<String, ErrorCode> {
    if s.chars().count() > version.max_text_length {
        Err(ErrorCode::ValueInvalid)
    } else {
        Ok(s)
    }
}

fn type_rank(v: &Value) -> u8 {
    match v {
        Value::Number(_) => 0,
        Value::Text(_) => 1,
        Value::Boolean(_) => 2,
        _ => 3,
    }
}

/// Ordering used by the comparison operators.
///
/// Blank takes the neutral value of the other side's kind (`0`, `""`,
/// `FALSE`). Across kinds, numbers sort before text and text before
/// booleans. Text compares case-insensitively. Callers strip errors first.
pub fn compare(a: &Value, b: &Value, locale: &Locale) -> Ordering {
    let a = a.scalar();
    let b = b.scalar();
    let (a, b) = match (a, b) {
        (Value::Blank, Value::Blank) => return Ordering::Equal,
        (Value::Blank, other) => (blank_like(other), other.clone()),
        (other, Value::Blank) => (other.clone(), blank_like(other)),
        (a, b) => (a.clone(), b.clone()),
    };
    match (&a, &b) {
        (Value::Number(x), Value::Number(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (Value::Text(x), Value::Text(y)) => locale.fold_case(x).cmp(&locale.fold_case(y)),
        (Value::Boolean(x), Value::Boolean(y)) => x.cmp(y),
        _ => type_rank(&a).cmp(&type_rank(&b)),
    }
}

fn blank_like(other: &Value) -> Value {
    match other {
        Value::Text(_) => Value::Text(String::new()),
        Value::Boolean(_) => Value::Boolean(false),
        _ => Value::Number(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_coercion_rules() {
        let loc = Locale::invariant();
        assert_eq!(to_number(&Value::Blank, &loc), Ok(0.0));
        assert_eq!(to_number(&Value::Boolean(true), &loc), Ok(1.0));
        assert_eq!(to_number(&Value::text(" 2.5 "), &loc), Ok(2.5));
        assert_eq!(
            to_number(&Value::text("TRUE"), &loc),
            Err(ErrorCode::ValueInvalid)
        );
        assert_eq!(
            to_number(&Value::Error(ErrorCode::NA), &loc),
            Err(ErrorCode::NA)
        );
    }

    #[test]
    fn text_and_boolean_coercion() {
        assert_eq!(to_text(&Value::Number(0.5)), "0.5");
        assert_eq!(to_text(&Value::Boolean(false)), "FALSE");
        assert_eq!(to_text(&Value::Blank), "");
        assert_eq!(to_boolean(&Value::text("true")), Ok(true));
        assert_eq!(to_boolean(&Value::Number(-2.0)), Ok(true));
        assert_eq!(
            to_boolean(&Value::text("yes")),
            Err(ErrorCode::ValueInvalid)
        );
    }

    #[test]
    fn comparison_orders_kinds() {
        let loc = Locale::invariant();
        assert_eq!(
            compare(&Value::Number(1e9), &Value::text("a"), &loc),
            Ordering::Less
        );
        assert_eq!(
            compare(&Value::text("zzz"), &Value::Boolean(false), &loc),
            Ordering::Less
        );
        assert_eq!(
            compare(&Value::text("ABC"), &Value::text("abc"), &loc),
            Ordering::Equal
        );
        assert_eq!(
            compare(&Value::Blank, &Value::Number(0.0), &loc),
            Ordering::Equal
        );
        assert_eq!(
            compare(&Value::Blank, &Value::text(""), &loc),
            Ordering::Equal
        );
        assert_eq!(
            compare(&Value::Blank, &Value::Boolean(true), &loc),
            Ordering::Less
        );
    }

    #[test]
    fn overlong_text_is_rejected() {
        let v = SpreadsheetVersion::EXCEL97;
        assert!(check_text_length("x".repeat(32_767), &v).is_ok());
        assert_eq!(
            check_text_length("x".repeat(32_768), &v),
            Err(ErrorCode::ValueInvalid)
        );
    }
}
