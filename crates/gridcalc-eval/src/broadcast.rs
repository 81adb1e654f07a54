//! Element-wise broadcasting of scalars and arrays.
//!
//! A scalar (or 1×1 array) repeats everywhere. A single row stretches down,
//! a single column stretches across. Positions outside an operand that
//! cannot stretch get `#N/A`.

use gridcalc_common::{ArrayValue, ErrorCode, Value};

fn shape(v: &Value) -> (usize, usize) {
    match v {
        Value::Array(a) => a.dimensions(),
        _ => (1, 1),
    }
}

/// Target shape: the largest extent on each axis.
pub fn broadcast_shape<'v>(values: impl IntoIterator<Item = &'v Value>) -> (usize, usize) {
    values
        .into_iter()
        .map(shape)
        .fold((1, 1), |(r, c), (vr, vc)| (r.max(vr), c.max(vc)))
}

/// Element of `v` at `(row, col)` of the broadcast grid.
pub fn element_at(v: &Value, row: usize, col: usize) -> Value {
    match v {
        Value::Array(a) => {
            let (rows, cols) = a.dimensions();
            let r = if rows == 1 { 0 } else { row };
            let c = if cols == 1 { 0 } else { col };
            a.get(r, c)
                .cloned()
                .unwrap_or(Value::Error(ErrorCode::NA))
        }
        other => other.clone(),
    }
}

pub fn is_array(v: &Value) -> bool {
    matches!(v, Value::Array(_))
}

/// Apply `f` per element; scalars go straight through.
pub fn map_unary<F>(v: &Value, mut f: F) -> Value
where
    F: FnMut(&Value) -> Value,
{
    match v {
        Value::Array(a) => Value::Array(a.map(|e| f(e))),
        other => f(other),
    }
}

/// Combine two operands element-wise under broadcasting.
pub fn combine<F>(left: &Value, right: &Value, mut f: F) -> Value
where
    F: FnMut(&Value, &Value) -> Value,
{
    if !is_array(left) && !is_array(right) {
        return f(left, right);
    }
    let (rows, cols) = broadcast_shape([left, right]);
    let mut data = Vec::with_capacity(rows * cols);
    for r in 0..rows {
        for c in 0..cols {
            let l = element_at(left, r, c);
            let rv = element_at(right, r, c);
            data.push(f(&l, &rv));
        }
    }
    ArrayValue::new(rows, cols, data)
        .map(Value::Array)
        .unwrap_or(Value::Error(ErrorCode::ValueInvalid))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arr(rows: Vec<Vec<f64>>) -> Value {
        Value::Array(
            ArrayValue::from_rows(
                rows.into_iter()
                    .map(|r| r.into_iter().map(Value::Number).collect())
                    .collect(),
            )
            .unwrap(),
        )
    }

    fn add(a: &Value, b: &Value) -> Value {
        match (a, b) {
            (Value::Number(x), Value::Number(y)) => Value::Number(x + y),
            (Value::Error(e), _) | (_, Value::Error(e)) => Value::Error(*e),
            _ => Value::Error(ErrorCode::ValueInvalid),
        }
    }

    #[test]
    fn scalar_stretches_over_array() {
        let out = combine(&arr(vec![vec![1.0, 2.0]]), &Value::Number(10.0), add);
        assert_eq!(out, arr(vec![vec![11.0, 12.0]]));
    }

    #[test]
    fn row_and_column_cross() {
        let row = arr(vec![vec![1.0, 2.0]]);
        let col = arr(vec![vec![10.0], vec![20.0]]);
        let out = combine(&row, &col, add);
        assert_eq!(out, arr(vec![vec![11.0, 12.0], vec![21.0, 22.0]]));
    }

    #[test]
    fn mismatched_extents_fill_na() {
        let a = arr(vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        let b = arr(vec![vec![1.0, 1.0, 1.0], vec![1.0, 1.0, 1.0]]);
        let Value::Array(out) = combine(&a, &b, add) else {
            panic!("expected array");
        };
        assert_eq!(out.dimensions(), (2, 3));
        assert_eq!(out.get(0, 2), Some(&Value::Error(ErrorCode::NA)));
        assert_eq!(out.get(1, 1), Some(&Value::Number(5.0)));
    }
}
