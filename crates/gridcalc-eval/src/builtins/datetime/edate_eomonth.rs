//! EDATE and EOMONTH

use chrono::{Datelike, Months, NaiveDate};
use gridcalc_common::{ErrorCode, Value};

use super::date_parts::checked_serial;
use crate::args::ArgumentHandle;
use crate::func_caps;
use crate::function::{Arity, Function};
use crate::function_registry::FunctionRegistry;
use crate::register_functions;
use crate::traits::FunctionContext;

/// Month arithmetic; chrono clamps the day to the end of a shorter month.
fn shift_months(date: NaiveDate, months: i64) -> Option<NaiveDate> {
    let n = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 {
        date.checked_add_months(n)
    } else {
        date.checked_sub_months(n)
    }
}

fn start_and_months<'a, 'b>(
    args: &'a [ArgumentHandle<'a, 'b>],
    ctx: &dyn FunctionContext,
) -> Result<(NaiveDate, i64), ErrorCode> {
    let start = args[0].number()?;
    let months = args[1].integer()?;
    let date = ctx
        .date_system()
        .serial_to_date(start)
        .ok_or(ErrorCode::Num)?;
    Ok((date, months))
}

/// `EDATE(start_date, months)`
#[derive(Debug)]
pub struct EdateFn;
impl Function for EdateFn {
    func_caps!(PURE, ELEMENTWISE, NUMERIC_ONLY);
    fn name(&self) -> &'static str {
        "EDATE"
    }
    fn arity(&self) -> Arity {
        Arity::Fixed(2)
    }
    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        ctx: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        let (date, months) = start_and_months(args, ctx)?;
        let target = shift_months(date, months).ok_or(ErrorCode::Num)?;
        let system = ctx.date_system();
        checked_serial(system, system.date_to_serial(target)).map(Value::Number)
    }
}

/// `EOMONTH(start_date, months)`: last day of the month `months` away.
#[derive(Debug)]
pub struct EomonthFn;
impl Function for EomonthFn {
    func_caps!(PURE, ELEMENTWISE, NUMERIC_ONLY);
    fn name(&self) -> &'static str {
        "EOMONTH"
    }
    fn arity(&self) -> Arity {
        Arity::Fixed(2)
    }
    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        ctx: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        let (date, months) = start_and_months(args, ctx)?;
        let target = date
            .with_day(1)
            .and_then(|first| shift_months(first, months.checked_add(1)?))
            .and_then(|next| next.pred_opt())
            .ok_or(ErrorCode::Num)?;
        let system = ctx.date_system();
        checked_serial(system, system.date_to_serial(target)).map(Value::Number)
    }
}

pub fn register_builtins(registry: &mut FunctionRegistry) {
    register_functions!(registry; EdateFn, EomonthFn);
}
