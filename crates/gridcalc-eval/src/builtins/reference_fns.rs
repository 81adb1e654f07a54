//! ROW, COLUMN, ROWS, COLUMNS and INDEX

use gridcalc_common::{ArrayValue, ErrorCode, ParamClass, Value};

use crate::args::{ArgumentHandle, Operand};
use crate::func_caps;
use crate::function::{Arity, Function};
use crate::function_registry::FunctionRegistry;
use crate::reference::ResolvedRef;
use crate::register_functions;
use crate::traits::FunctionContext;

/// Reference an argument names, or `#VALUE!` for anything else.
fn reference_arg<'a, 'b>(arg: &ArgumentHandle<'a, 'b>) -> Result<ResolvedRef, ErrorCode> {
    match arg.operand() {
        Operand::Ref(r) => Ok(*r),
        Operand::Value(Value::Error(e)) => Err(*e),
        _ => Err(ErrorCode::ValueInvalid),
    }
}

/// `(first_row, first_col, rows, cols)` of the argument, or of the calling
/// cell when the argument is omitted.
fn position<'a, 'b>(
    args: &'a [ArgumentHandle<'a, 'b>],
    ctx: &dyn FunctionContext,
) -> Result<(u32, u32, u32, u32), ErrorCode> {
    match args.first().filter(|a| !a.is_missing()) {
        Some(arg) => {
            let area = reference_arg(arg)?.area();
            Ok((area.first_row(), area.first_col(), area.height(), area.width()))
        }
        None => {
            let cell = ctx.current_cell().ok_or(ErrorCode::ValueInvalid)?;
            Ok((cell.row, cell.col, 1, 1))
        }
    }
}

fn ordinals(first: u32, count: u32, as_column: bool) -> Value {
    let data: Vec<Value> = (first..first + count)
        .map(|i| Value::Number(f64::from(i) + 1.0))
        .collect();
    let (rows, cols) = if as_column {
        (data.len(), 1)
    } else {
        (1, data.len())
    };
    ArrayValue::new(rows, cols, data)
        .map(Value::Array)
        .unwrap_or(Value::Error(ErrorCode::ValueInvalid))
}

/* ─────────────────────────── ROW() / COLUMN() ───────────────────────────── */

/// `ROW([reference])`: 1-based row of the reference's top-left cell. In the
/// array path a multi-row area yields a column of row numbers.
#[derive(Debug)]
pub struct RowFn;
impl Function for RowFn {
    func_caps!(PURE, BY_REF);
    fn name(&self) -> &'static str {
        "ROW"
    }
    fn biff_index(&self) -> Option<u16> {
        Some(8)
    }
    fn arity(&self) -> Arity {
        Arity::between(0, 1)
    }
    fn param_class(&self, _: usize) -> ParamClass {
        ParamClass::Reference
    }
    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        ctx: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        let (row, _, _, _) = position(args, ctx)?;
        Ok(Value::Number(f64::from(row) + 1.0))
    }
    fn eval_array<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        ctx: &dyn FunctionContext,
    ) -> Option<Result<Value, ErrorCode>> {
        Some(position(args, ctx).map(|(row, _, rows, _)| ordinals(row, rows, true)))
    }
}

/// `COLUMN([reference])`
#[derive(Debug)]
pub struct ColumnFn;
impl Function for ColumnFn {
    func_caps!(PURE, BY_REF);
    fn name(&self) -> &'static str {
        "COLUMN"
    }
    fn biff_index(&self) -> Option<u16> {
        Some(9)
    }
    fn arity(&self) -> Arity {
        Arity::between(0, 1)
    }
    fn param_class(&self, _: usize) -> ParamClass {
        ParamClass::Reference
    }
    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        ctx: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        let (_, col, _, _) = position(args, ctx)?;
        Ok(Value::Number(f64::from(col) + 1.0))
    }
    fn eval_array<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        ctx: &dyn FunctionContext,
    ) -> Option<Result<Value, ErrorCode>> {
        Some(position(args, ctx).map(|(_, col, _, cols)| ordinals(col, cols, false)))
    }
}

/* ─────────────────────────── ROWS() / COLUMNS() ─────────────────────────── */

/// Height and width of a reference, an array constant or a scalar (1 x 1).
fn extent<'a, 'b>(arg: &ArgumentHandle<'a, 'b>) -> Result<(usize, usize), ErrorCode> {
    match arg.operand() {
        Operand::Ref(r) => {
            let (rows, cols) = r.dimensions();
            Ok((rows as usize, cols as usize))
        }
        Operand::Value(Value::Array(a)) => Ok(a.dimensions()),
        Operand::Value(Value::Error(e)) => Err(*e),
        Operand::Value(_) | Operand::Missing => Ok((1, 1)),
    }
}

#[derive(Debug)]
pub struct RowsFn;
impl Function for RowsFn {
    func_caps!(PURE, BY_REF);
    fn name(&self) -> &'static str {
        "ROWS"
    }
    fn biff_index(&self) -> Option<u16> {
        Some(76)
    }
    fn arity(&self) -> Arity {
        Arity::Fixed(1)
    }
    fn param_class(&self, _: usize) -> ParamClass {
        ParamClass::Reference
    }
    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        extent(&args[0]).map(|(rows, _)| Value::Number(rows as f64))
    }
}

#[derive(Debug)]
pub struct ColumnsFn;
impl Function for ColumnsFn {
    func_caps!(PURE, BY_REF);
    fn name(&self) -> &'static str {
        "COLUMNS"
    }
    fn biff_index(&self) -> Option<u16> {
        Some(77)
    }
    fn arity(&self) -> Arity {
        Arity::Fixed(1)
    }
    fn param_class(&self, _: usize) -> ParamClass {
        ParamClass::Reference
    }
    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        extent(&args[0]).map(|(_, cols)| Value::Number(cols as f64))
    }
}

/* ──────────────────────────────── INDEX() ───────────────────────────────── */

/// 0-based position for a 1-based index; `None` selects the whole row or
/// column.
fn index_position(n: i64, len: usize) -> Result<Option<usize>, ErrorCode> {
    match usize::try_from(n) {
        Err(_) => Err(ErrorCode::ValueInvalid),
        Ok(0) => Ok(None),
        Ok(n) if n > len => Err(ErrorCode::Ref),
        Ok(n) => Ok(Some(n - 1)),
    }
}

/// `INDEX(array, row_num, [col_num])`. A zero index selects a whole row or
/// column. Only the selected cells of a reference are evaluated.
#[derive(Debug)]
pub struct IndexFn;
impl Function for IndexFn {
    func_caps!(PURE, BY_REF);
    fn name(&self) -> &'static str {
        "INDEX"
    }
    fn biff_index(&self) -> Option<u16> {
        Some(29)
    }
    fn arity(&self) -> Arity {
        Arity::between(2, 3)
    }
    fn param_class(&self, idx: usize) -> ParamClass {
        if idx == 0 {
            ParamClass::Reference
        } else {
            ParamClass::Value
        }
    }
    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        ctx: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        let source = args[0].operand();
        if let Operand::Ref(ResolvedRef::MultiSheetArea(_)) = source {
            return Err(ErrorCode::Ref);
        }
        let (rows, cols) = extent(&args[0])?;
        let first = args[1].integer()?;
        let second = match args.get(2) {
            Some(a) if !a.is_missing() => Some(a.integer()?),
            _ => None,
        };
        // a single index into a one-row source picks a column
        let (row_num, col_num) = match second {
            Some(c) => (first, c),
            None if rows == 1 && cols > 1 => (1, first),
            None => (first, 0),
        };
        let row_sel = index_position(row_num, rows)?;
        let col_sel = index_position(col_num, cols)?;
        let (r0, r1) = row_sel.map_or((0, rows - 1), |r| (r, r));
        let (c0, c1) = col_sel.map_or((0, cols - 1), |c| (c, c));

        let element = |r: usize, c: usize| -> Value {
            match source {
                Operand::Ref(reference) => reference
                    .area()
                    .cell_at(r as u32, c as u32)
                    .map(|cell| ctx.cell_value(cell))
                    .unwrap_or(Value::Error(ErrorCode::Ref)),
                Operand::Value(Value::Array(a)) => a.get(r, c).cloned().unwrap_or(Value::Blank),
                _ => args[0].value(),
            }
        };
        if r0 == r1 && c0 == c1 {
            return Ok(element(r0, c0));
        }
        let mut data = Vec::with_capacity((r1 - r0 + 1) * (c1 - c0 + 1));
        for r in r0..=r1 {
            for c in c0..=c1 {
                data.push(element(r, c));
            }
        }
        ArrayValue::new(r1 - r0 + 1, c1 - c0 + 1, data)
            .map(Value::Array)
            .ok_or(ErrorCode::ValueInvalid)
    }
}

pub fn register_builtins(registry: &mut FunctionRegistry) {
    register_functions!(registry; RowFn, ColumnFn, RowsFn, ColumnsFn, IndexFn);
}
