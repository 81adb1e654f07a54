use gridcalc_common::{ArrayValue, ErrorCode, Value};

use super::{area, num, op};
use crate::test_workbook::TestWorkbook;
use crate::token::{BinaryOp, Token};

fn column(values: &[f64]) -> Token {
    Token::Array(
        ArrayValue::from_rows(values.iter().map(|v| vec![Value::Number(*v)]).collect()).unwrap(),
    )
}

fn numbers(grid: &ArrayValue) -> Vec<Value> {
    grid.iter().cloned().collect()
}

#[test]
fn short_result_pads_the_footprint_with_na() {
    let wb = TestWorkbook::new().with_array_formula("Sheet1", "B1:B3", vec![column(&[1.0, 2.0])]);
    let b1 = wb.cell_ref("Sheet1", "B1");
    let b2 = wb.cell_ref("Sheet1", "B2");
    let b3 = wb.cell_ref("Sheet1", "B3");
    let eval = wb.evaluator();
    let grid = eval.evaluate_array_formula(b1).unwrap().unwrap();
    assert_eq!(grid.dimensions(), (3, 1));
    assert_eq!(
        numbers(&grid),
        vec![Value::Number(1.0), Value::Number(2.0), Value::Error(ErrorCode::NA)]
    );
    assert_eq!(eval.evaluate_cell(b2).unwrap(), Value::Number(2.0));
    assert_eq!(eval.evaluate_cell(b3).unwrap(), Value::Error(ErrorCode::NA));
}

#[test]
fn long_result_is_truncated_to_the_footprint() {
    let wb = TestWorkbook::new()
        .with_array_formula("Sheet1", "B1:B2", vec![column(&[1.0, 2.0, 3.0])]);
    let b1 = wb.cell_ref("Sheet1", "B1");
    let grid = wb.evaluator().evaluate_array_formula(b1).unwrap().unwrap();
    assert_eq!(numbers(&grid), vec![Value::Number(1.0), Value::Number(2.0)]);
}

#[test]
fn scalar_result_fills_every_cell() {
    let wb = TestWorkbook::new().with_array_formula("Sheet1", "C1:D2", vec![num(7.0)]);
    let c1 = wb.cell_ref("Sheet1", "C1");
    let d2 = wb.cell_ref("Sheet1", "D2");
    let eval = wb.evaluator();
    let grid = eval.evaluate_array_formula(c1).unwrap().unwrap();
    assert!(grid.iter().all(|v| *v == Value::Number(7.0)));
    assert_eq!(eval.evaluate_cell(d2).unwrap(), Value::Number(7.0));
}

fn with_inputs() -> TestWorkbook {
    TestWorkbook::new()
        .with_value("Sheet1", "A1", 1.0)
        .with_value("Sheet1", "A2", -2.0)
        .with_value("Sheet1", "A3", 3.0)
}

#[test]
fn operators_broadcast_in_array_context() {
    let tokens = vec![area("A1:A3"), num(2.0), op(BinaryOp::Mul)];
    let wb = with_inputs().with_array_formula("Sheet1", "B1:B3", tokens.clone());
    let b1 = wb.cell_ref("Sheet1", "B1");
    let grid = wb.evaluator().evaluate_array_formula(b1).unwrap().unwrap();
    assert_eq!(
        numbers(&grid),
        vec![Value::Number(2.0), Value::Number(-4.0), Value::Number(6.0)]
    );

    // the same formula in an ordinary cell intersects to the top-left
    let wb = with_inputs().with_formula("Sheet1", "C1", tokens);
    let c1 = wb.cell_ref("Sheet1", "C1");
    assert_eq!(wb.evaluator().evaluate_cell(c1).unwrap(), Value::Number(2.0));
}

#[test]
fn elementwise_functions_broadcast_in_array_context() {
    let wb = with_inputs().with_array_formula(
        "Sheet1",
        "B1:B3",
        vec![area("A1:A3"), Token::call("ABS", 1)],
    );
    let b2 = wb.cell_ref("Sheet1", "B2");
    assert_eq!(wb.evaluator().evaluate_cell(b2).unwrap(), Value::Number(2.0));
}

#[test]
fn row_numbers_of_an_area() {
    let wb = TestWorkbook::new().with_array_formula(
        "Sheet1",
        "B1:B3",
        vec![area("A4:A6"), Token::call("ROW", 1)],
    );
    let b1 = wb.cell_ref("Sheet1", "B1");
    let grid = wb.evaluator().evaluate_array_formula(b1).unwrap().unwrap();
    assert_eq!(
        numbers(&grid),
        vec![Value::Number(4.0), Value::Number(5.0), Value::Number(6.0)]
    );
}

#[test]
fn group_cells_feed_other_formulas() {
    let wb = with_inputs()
        .with_array_formula(
            "Sheet1",
            "B1:B3",
            vec![area("A1:A3"), num(10.0), op(BinaryOp::Add)],
        )
        .with_formula("Sheet1", "C1", vec![area("B1:B3"), Token::call("SUM", 1)]);
    let c1 = wb.cell_ref("Sheet1", "C1");
    assert_eq!(wb.evaluator().evaluate_cell(c1).unwrap(), Value::Number(32.0));
}

#[test]
fn group_queries() {
    let wb = TestWorkbook::new()
        .with_array_formula("Sheet1", "B1:B3", vec![num(1.0)])
        .with_formula("Sheet1", "C1", vec![num(1.0)])
        .with_value("Sheet1", "D1", 1.0);
    let b1 = wb.cell_ref("Sheet1", "B1");
    let b2 = wb.cell_ref("Sheet1", "B2");
    let c1 = wb.cell_ref("Sheet1", "C1");
    let d1 = wb.cell_ref("Sheet1", "D1");
    let eval = wb.evaluator();
    assert!(eval.is_array_formula_anchor(b1));
    assert!(!eval.is_array_formula_anchor(b2));
    assert_eq!(eval.evaluate_array_formula(b2).unwrap(), None);
    assert_eq!(
        eval.array_formula_footprint(b2).map(|a| (a.height(), a.width())),
        Some((3, 1))
    );
    assert!(eval.is_formula_cell(b2));
    assert!(eval.is_formula_cell(c1));
    assert!(!eval.is_formula_cell(d1));
}
