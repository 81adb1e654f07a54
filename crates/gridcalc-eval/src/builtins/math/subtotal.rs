use gridcalc_common::{CellRef, ErrorCode, ParamClass, Value};

use crate::args::ArgumentHandle;
use crate::func_caps;
use crate::function::{Arity, Function};
use crate::function_registry::FunctionRegistry;
use crate::register_functions;
use crate::traits::FunctionContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Aggregate {
    Average,
    Count,
    CountA,
    Max,
    Min,
    Product,
    StDev,
    StDevP,
    Sum,
    Var,
    VarP,
}

impl Aggregate {
    /// Function code → aggregate, plus whether hidden rows are skipped.
    fn from_code(code: i64) -> Option<(Self, bool)> {
        let (base, skip_hidden) = match code {
            1..=11 => (code, false),
            101..=111 => (code - 100, true),
            _ => return None,
        };
        let agg = match base {
            1 => Self::Average,
            2 => Self::Count,
            3 => Self::CountA,
            4 => Self::Max,
            5 => Self::Min,
            6 => Self::Product,
            7 => Self::StDev,
            8 => Self::StDevP,
            9 => Self::Sum,
            10 => Self::Var,
            _ => Self::VarP,
        };
        Some((agg, skip_hidden))
    }

    fn apply(self, nums: &[f64], non_blank: usize) -> Result<f64, ErrorCode> {
        let n = nums.len() as f64;
        let mean = || nums.iter().sum::<f64>() / n;
        let sq_dev = || {
            let m = mean();
            nums.iter().map(|x| (x - m) * (x - m)).sum::<f64>()
        };
        match self {
            Self::Sum => Ok(nums.iter().sum()),
            Self::Count => Ok(n),
            Self::CountA => Ok(non_blank as f64),
            Self::Max => Ok(nums.iter().copied().reduce(f64::max).unwrap_or(0.0)),
            Self::Min => Ok(nums.iter().copied().reduce(f64::min).unwrap_or(0.0)),
            Self::Product if nums.is_empty() => Ok(0.0),
            Self::Product => Ok(nums.iter().product()),
            Self::Average if nums.is_empty() => Err(ErrorCode::DivZero),
            Self::Average => Ok(mean()),
            Self::Var | Self::StDev if nums.len() < 2 => Err(ErrorCode::DivZero),
            Self::VarP | Self::StDevP if nums.is_empty() => Err(ErrorCode::DivZero),
            Self::Var => Ok(sq_dev() / (n - 1.0)),
            Self::StDev => Ok((sq_dev() / (n - 1.0)).sqrt()),
            Self::VarP => Ok(sq_dev() / n),
            Self::StDevP => Ok((sq_dev() / n).sqrt()),
        }
    }

    fn counts_errors(self) -> bool {
        matches!(self, Self::Count | Self::CountA)
    }
}

/// `SUBTOTAL(function_num, ref1, [ref2], ...)`.
///
/// Cells that hold a `SUBTOTAL` formula of their own are left out so nested
/// subtotals are not counted twice. Codes 101-111 also leave out rows the
/// sheet hides; for a 3-D reference each sheet's rows are checked on that
/// sheet.
#[derive(Debug)]
pub struct SubtotalFn;
impl Function for SubtotalFn {
    func_caps!(PURE, REDUCTION, BY_REF);
    fn name(&self) -> &'static str {
        "SUBTOTAL"
    }
    fn biff_index(&self) -> Option<u16> {
        Some(344)
    }
    fn arity(&self) -> Arity {
        Arity::variadic(2)
    }
    fn param_class(&self, idx: usize) -> ParamClass {
        if idx == 0 {
            ParamClass::Value
        } else {
            ParamClass::Reference
        }
    }
    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        ctx: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        let (agg, skip_hidden) =
            Aggregate::from_code(args[0].integer()?).ok_or(ErrorCode::ValueInvalid)?;
        let mut nums = Vec::new();
        let mut non_blank = 0usize;
        for arg in &args[1..] {
            let Some(reference) = arg.reference() else {
                return Err(arg.value().error().unwrap_or(ErrorCode::ValueInvalid));
            };
            for slice in reference.area().sheets() {
                let sheet = slice.first_sheet();
                let Some(last) = ctx.last_row_num(sheet) else {
                    continue;
                };
                if last < slice.first_row() {
                    continue;
                }
                for row in slice.first_row()..=last.min(slice.last_row()) {
                    if skip_hidden && ctx.is_row_hidden(sheet, row) {
                        continue;
                    }
                    for col in slice.first_col()..=slice.last_col() {
                        let cell = CellRef::new(sheet, row, col);
                        if ctx.is_subtotal_cell(cell) {
                            continue;
                        }
                        match ctx.cell_value(cell) {
                            Value::Blank => {}
                            Value::Number(n) => {
                                nums.push(n);
                                non_blank += 1;
                            }
                            Value::Error(e) if !agg.counts_errors() => return Err(e),
                            _ => non_blank += 1,
                        }
                    }
                }
            }
        }
        agg.apply(&nums, non_blank).map(Value::Number)
    }
}

pub fn register_builtins(registry: &mut FunctionRegistry) {
    register_functions!(registry; SubtotalFn);
}
