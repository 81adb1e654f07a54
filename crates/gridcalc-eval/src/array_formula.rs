//! Array-formula groups: one formula, one result, spread over a footprint.

use gridcalc_common::{AreaRef, ArrayValue, CellRef, ErrorCode, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArrayFormulaGroup {
    pub anchor: CellRef,
    pub footprint: AreaRef,
}

impl ArrayFormulaGroup {
    /// The anchor is the footprint's top-left cell.
    pub fn new(footprint: AreaRef) -> Self {
        Self {
            anchor: footprint.top_left(),
            footprint,
        }
    }

    pub fn is_anchor(&self, cell: CellRef) -> bool {
        self.anchor == cell
    }

    pub fn contains(&self, cell: CellRef) -> bool {
        self.footprint.contains(cell)
    }

    /// Row/column offset of `cell` inside the footprint.
    pub fn offset_of(&self, cell: CellRef) -> Option<(usize, usize)> {
        if !self.contains(cell) {
            return None;
        }
        Some((
            (cell.row - self.footprint.first_row()) as usize,
            (cell.col - self.footprint.first_col()) as usize,
        ))
    }
}

/// Lay an anchor's result over its footprint.
///
/// A scalar (or 1×1 array) fills every cell. A larger array maps by
/// relative offset; footprint cells beyond the array get `#N/A`, array
/// elements beyond the footprint are dropped. Blank elements show as `0`.
pub fn spread_over_footprint(result: &Value, footprint: &AreaRef) -> ArrayValue {
    let rows = footprint.height() as usize;
    let cols = footprint.width() as usize;
    let shown = |v: &Value| match v {
        Value::Blank => Value::Number(0.0),
        other => other.clone(),
    };
    let data = match result {
        Value::Array(a) if a.dimensions() != (1, 1) => (0..rows)
            .flat_map(|r| (0..cols).map(move |c| (r, c)))
            .map(|(r, c)| a.get(r, c).map_or(Value::Error(ErrorCode::NA), shown))
            .collect(),
        scalar => vec![shown(scalar.scalar()); rows * cols],
    };
    ArrayValue::new(rows, cols, data)
        .unwrap_or_else(|| ArrayValue::single(Value::Error(ErrorCode::ValueInvalid)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(values: &[f64]) -> Value {
        Value::Array(
            ArrayValue::from_rows(values.iter().map(|v| vec![Value::Number(*v)]).collect())
                .unwrap(),
        )
    }

    #[test]
    fn short_array_pads_with_na() {
        let footprint = AreaRef::parse_a1(0, "B1:B3").unwrap();
        let out = spread_over_footprint(&column(&[1.0, 2.0]), &footprint);
        assert_eq!(out.get(0, 0), Some(&Value::Number(1.0)));
        assert_eq!(out.get(1, 0), Some(&Value::Number(2.0)));
        assert_eq!(out.get(2, 0), Some(&Value::Error(ErrorCode::NA)));
    }

    #[test]
    fn long_array_is_truncated() {
        let footprint = AreaRef::parse_a1(0, "A1:A2").unwrap();
        let out = spread_over_footprint(&column(&[1.0, 2.0, 3.0]), &footprint);
        assert_eq!(out.dimensions(), (2, 1));
        assert_eq!(out.get(1, 0), Some(&Value::Number(2.0)));
    }

    #[test]
    fn scalar_fills_footprint() {
        let footprint = AreaRef::parse_a1(0, "A1:B2").unwrap();
        let out = spread_over_footprint(&Value::text("x"), &footprint);
        assert!(out.iter().all(|v| v == &Value::text("x")));
    }

    #[test]
    fn offsets_are_relative_to_anchor() {
        let group = ArrayFormulaGroup::new(AreaRef::parse_a1(2, "C3:D5").unwrap());
        assert_eq!(group.anchor, CellRef::new(2, 2, 2));
        assert_eq!(group.offset_of(CellRef::new(2, 4, 3)), Some((2, 1)));
        assert_eq!(group.offset_of(CellRef::new(1, 4, 3)), None);
    }
}
