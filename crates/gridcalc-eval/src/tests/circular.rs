use gridcalc_common::{ErrorCode, Value};

use super::{area, cell, num, op};
use crate::engine::EvalConfig;
use crate::error::EvalFailure;
use crate::test_workbook::TestWorkbook;
use crate::token::{BinaryOp, Token};

fn circ() -> Value {
    Value::Error(ErrorCode::CircularRef)
}

#[test]
fn self_reference() {
    let wb = TestWorkbook::new().with_formula(
        "Sheet1",
        "A1",
        vec![cell("A1"), num(1.0), op(BinaryOp::Add)],
    );
    let a1 = wb.cell_ref("Sheet1", "A1");
    assert_eq!(wb.evaluator().evaluate_cell(a1).unwrap(), circ());
}

#[test]
fn two_cell_cycle_fails_both_members() {
    let wb = TestWorkbook::new()
        .with_formula("Sheet1", "A1", vec![cell("B1")])
        .with_formula("Sheet1", "B1", vec![cell("A1"), num(1.0), op(BinaryOp::Add)]);
    let cells = [wb.cell_ref("Sheet1", "A1"), wb.cell_ref("Sheet1", "B1")];
    let eval = wb.evaluator();
    assert_eq!(eval.evaluate_cell(cells[0]).unwrap(), circ());
    assert_eq!(eval.evaluate_cell(cells[1]).unwrap(), circ());
    assert_eq!(eval.evaluate_cells(&cells).unwrap(), vec![circ(), circ()]);
}

#[test]
fn whole_frame_is_failed() {
    // C1 sits outside the cycle but was on the frame when it closed
    let wb = TestWorkbook::new()
        .with_formula("Sheet1", "A1", vec![cell("B1")])
        .with_formula("Sheet1", "B1", vec![cell("A1")])
        .with_formula("Sheet1", "C1", vec![cell("A1"), num(1.0), op(BinaryOp::Add)]);
    let c1 = wb.cell_ref("Sheet1", "C1");
    assert_eq!(wb.evaluator().evaluate_cell(c1).unwrap(), circ());
}

#[test]
fn cycle_through_an_aggregate_range() {
    let wb = TestWorkbook::new()
        .with_value("Sheet1", "A1", 1.0)
        .with_value("Sheet1", "A2", 2.0)
        .with_formula("Sheet1", "A3", vec![area("A1:A3"), Token::call("SUM", 1)]);
    let a3 = wb.cell_ref("Sheet1", "A3");
    assert_eq!(wb.evaluator().evaluate_cell(a3).unwrap(), circ());
}

#[test]
fn diamond_is_not_a_cycle() {
    let wb = TestWorkbook::new()
        .with_value("Sheet1", "D1", 2.0)
        .with_formula("Sheet1", "B1", vec![cell("D1")])
        .with_formula("Sheet1", "C1", vec![cell("D1")])
        .with_formula("Sheet1", "A1", vec![cell("B1"), cell("C1"), op(BinaryOp::Add)]);
    let a1 = wb.cell_ref("Sheet1", "A1");
    assert_eq!(wb.evaluator().evaluate_cell(a1).unwrap(), Value::Number(4.0));
}

#[test]
fn frame_unwinds_after_a_cycle() {
    let wb = TestWorkbook::new()
        .with_formula("Sheet1", "A1", vec![cell("B1")])
        .with_formula("Sheet1", "B1", vec![cell("A1")])
        .with_value("Sheet1", "C1", 5.0)
        .with_formula("Sheet1", "D1", vec![cell("C1"), num(1.0), op(BinaryOp::Add)]);
    let interp = wb.interpreter();
    let a1 = wb.cell_ref("Sheet1", "A1");
    assert_eq!(*interp.cell_value(a1).unwrap(), circ());
    assert_eq!(interp.debug_frame_len(), 0);
    // unrelated cells evaluated afterwards under the same call are unaffected
    let d1 = wb.cell_ref("Sheet1", "D1");
    assert_eq!(*interp.cell_value(d1).unwrap(), Value::Number(6.0));
}

#[test]
fn chains_deeper_than_the_limit_fail_structurally() {
    let mut wb = TestWorkbook::new()
        .with_config(EvalConfig::default().with_max_depth(5))
        .with_value("Sheet1", "A10", 1.0);
    for row in 1..10 {
        let next = format!("A{}", row + 1);
        wb.set_formula(
            "Sheet1",
            &format!("A{row}"),
            vec![cell(&next), num(1.0), op(BinaryOp::Add)],
        );
    }
    let a1 = wb.cell_ref("Sheet1", "A1");
    let a6 = wb.cell_ref("Sheet1", "A6");
    let eval = wb.evaluator();
    assert_eq!(
        eval.evaluate_cell(a1),
        Err(EvalFailure::EvaluationTooDeep { depth: 5 })
    );
    assert_eq!(eval.evaluate_cell(a6).unwrap(), Value::Number(5.0));
}

/// `A{row} = A{row+1} + 1` for `links` rows, ending on a literal 1.
fn chain(links: u32, link: impl Fn(&str) -> Vec<Token>) -> TestWorkbook {
    let mut wb = TestWorkbook::new();
    wb.set_value("Sheet1", &format!("A{}", links + 1), 1.0);
    for row in 1..=links {
        let next = format!("A{}", row + 1);
        wb.set_formula("Sheet1", &format!("A{row}"), link(&next));
    }
    wb
}

fn plus_one(next: &str) -> Vec<Token> {
    vec![cell(next), num(1.0), op(BinaryOp::Add)]
}

fn sum_plus_one(next: &str) -> Vec<Token> {
    vec![
        area(&format!("{next}:{next}")),
        Token::call("SUM", 1),
        num(1.0),
        op(BinaryOp::Add),
    ]
}

#[test]
fn chains_just_under_the_default_limit_evaluate() {
    let links = EvalConfig::default().max_depth as u32 - 1;
    for link in [plus_one as fn(&str) -> Vec<Token>, sum_plus_one] {
        let wb = chain(links, link);
        let a1 = wb.cell_ref("Sheet1", "A1");
        assert_eq!(
            wb.evaluator().evaluate_cell(a1),
            Ok(Value::Number(f64::from(links) + 1.0))
        );
    }
}

#[test]
fn chains_past_the_default_limit_fail_structurally() {
    let depth = EvalConfig::default().max_depth;
    let wb = chain(depth as u32 + 50, plus_one);
    let a1 = wb.cell_ref("Sheet1", "A1");
    assert_eq!(
        wb.evaluator().evaluate_cell(a1),
        Err(EvalFailure::EvaluationTooDeep { depth })
    );
}
