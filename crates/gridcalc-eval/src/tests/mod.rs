//! Engine-level tests: token streams evaluated through `TestWorkbook`.

mod array_formula;
mod circular;
mod properties;

use gridcalc_common::Value;

use crate::error::EvalFailure;
use crate::test_workbook::TestWorkbook;
use crate::token::{BinaryOp, Token};

pub(crate) fn num(n: f64) -> Token {
    Token::Number(n)
}

pub(crate) fn cell(a1: &str) -> Token {
    Token::ref_a1(a1).unwrap_or_else(|| panic!("bad A1 ref {a1}"))
}

pub(crate) fn area(a1: &str) -> Token {
    Token::area_a1(a1).unwrap_or_else(|| panic!("bad A1 area {a1}"))
}

pub(crate) fn op(op: BinaryOp) -> Token {
    Token::Binary(op)
}

/// Evaluate `tokens` as if they were the formula of `Sheet1!Z99`.
pub(crate) fn eval_in(wb: TestWorkbook, tokens: Vec<Token>) -> Result<Value, EvalFailure> {
    let at = wb.cell_ref("Sheet1", "Z99");
    wb.evaluator().evaluate_formula(at, &tokens)
}

pub(crate) fn eval(tokens: Vec<Token>) -> Value {
    eval_in(TestWorkbook::new(), tokens).expect("structural failure")
}
