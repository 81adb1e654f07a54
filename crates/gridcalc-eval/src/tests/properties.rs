use gridcalc_common::{ErrorCode, Value};
use proptest::prelude::*;

use super::{eval, num, op};
use crate::coercion::{to_boolean, to_number, to_text};
use crate::locale::Locale;
use crate::token::{BinaryOp, Token};

fn error_code() -> impl Strategy<Value = ErrorCode> {
    proptest::sample::select(ErrorCode::ALL.to_vec())
}

fn arithmetic_op() -> impl Strategy<Value = BinaryOp> {
    proptest::sample::select(vec![
        BinaryOp::Add,
        BinaryOp::Sub,
        BinaryOp::Mul,
        BinaryOp::Div,
        BinaryOp::Pow,
        BinaryOp::Concat,
        BinaryOp::Eq,
        BinaryOp::Lt,
    ])
}

fn finite() -> impl Strategy<Value = f64> {
    // stays clear of f64::MAX, where 15 rounded digits overflow on the way back
    prop_oneof![-1e300..1e300f64, -1e3..1e3f64, -1e-200..1e-200f64]
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        failure_persistence: None,
        .. ProptestConfig::default()
    })]

    #[test]
    fn number_text_round_trip(n in finite()) {
        let text = to_text(&Value::Number(n));
        let back = to_number(&Value::Text(text.clone()), &Locale::invariant());
        prop_assert!(back.is_ok(), "{text} did not parse back");
        let back = back.unwrap();
        let tolerance = (n.abs() * 1e-13).max(1e-300);
        prop_assert!((back - n).abs() <= tolerance, "{n} -> {text} -> {back}");
    }

    #[test]
    fn boolean_text_round_trip(b in any::<bool>()) {
        prop_assert_eq!(to_boolean(&Value::text(to_text(&Value::Boolean(b)))), Ok(b));
    }

    #[test]
    fn error_operand_is_sticky(e in error_code(), x in -1e6..1e6f64, bin in arithmetic_op()) {
        let left = eval(vec![Token::Error(e), num(x), op(bin)]);
        prop_assert_eq!(left, Value::Error(e));
        let right = eval(vec![num(x), Token::Error(e), op(bin)]);
        prop_assert_eq!(right, Value::Error(e));
    }

    #[test]
    fn left_error_wins(a in error_code(), b in error_code(), bin in arithmetic_op()) {
        let out = eval(vec![Token::Error(a), Token::Error(b), op(bin)]);
        prop_assert_eq!(out, Value::Error(a));
    }

    #[test]
    fn date_functions_reject_rather_than_panic(x in any::<f64>(), y in any::<f64>()) {
        prop_assume!(x.is_finite() && y.is_finite());
        for name in ["YEAR", "MONTH", "DAY"] {
            let out = eval(vec![num(x), Token::call(name, 1)]);
            prop_assert!(matches!(out, Value::Number(_) | Value::Error(ErrorCode::Num)), "{name}({x}) = {out:?}");
        }
        for name in ["EDATE", "EOMONTH"] {
            let out = eval(vec![num(x), num(y), Token::call(name, 2)]);
            prop_assert!(matches!(out, Value::Number(_) | Value::Error(ErrorCode::Num)), "{name}({x},{y}) = {out:?}");
        }
        let out = eval(vec![num(2024.0), num(x), num(y), Token::call("DATE", 3)]);
        prop_assert!(matches!(out, Value::Number(_) | Value::Error(ErrorCode::Num)), "DATE(2024,{x},{y}) = {out:?}");
    }

    #[test]
    fn coercion_never_invents_errors(e in error_code()) {
        let v = Value::Error(e);
        prop_assert_eq!(to_number(&v, &Locale::invariant()), Err(e));
        prop_assert_eq!(to_boolean(&v), Err(e));
    }
}
