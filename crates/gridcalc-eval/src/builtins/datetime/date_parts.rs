//! DATE and its inverses YEAR, MONTH, DAY

use chrono::{Datelike, NaiveDate};
use gridcalc_common::{DateSystem, ErrorCode, Value};

use crate::args::ArgumentHandle;
use crate::func_caps;
use crate::function::{Arity, Function};
use crate::function_registry::FunctionRegistry;
use crate::register_functions;
use crate::traits::FunctionContext;

/// Serial for a possibly out-of-range year/month/day triple. Months and days
/// roll over into neighbouring months and years the way `DATE` does.
pub(crate) fn ymd_to_serial(
    system: DateSystem,
    year: i64,
    month: i64,
    day: i64,
) -> Result<f64, ErrorCode> {
    let total = year
        .checked_mul(12)
        .and_then(|t| t.checked_add(month.checked_sub(1)?))
        .ok_or(ErrorCode::Num)?;
    let y = i32::try_from(total.div_euclid(12)).map_err(|_| ErrorCode::Num)?;
    let m = total.rem_euclid(12) as u32 + 1;
    let first = NaiveDate::from_ymd_opt(y, m, 1).ok_or(ErrorCode::Num)?;
    // offset from the first keeps the phantom 1900-02-29 reachable
    let day_offset = day.checked_sub(1).ok_or(ErrorCode::Num)?;
    let serial = system.date_to_serial(first) + day_offset as f64;
    checked_serial(system, serial)
}

pub(crate) fn checked_serial(system: DateSystem, serial: f64) -> Result<f64, ErrorCode> {
    match system.serial_to_date(serial) {
        Some(_) => Ok(serial),
        None => Err(ErrorCode::Num),
    }
}

/// Calendar parts of a serial. Under the 1900 system serial 0 reads as
/// 1900-01-00 and serial 60 as 1900-02-29.
pub(crate) fn serial_to_ymd(system: DateSystem, serial: f64) -> Result<(i32, u32, u32), ErrorCode> {
    if system == DateSystem::Excel1900 && serial >= 0.0 {
        let days = serial.trunc();
        if days == 0.0 {
            return Ok((1900, 1, 0));
        }
        if days == 60.0 {
            return Ok((1900, 2, 29));
        }
    }
    let date = system.serial_to_date(serial).ok_or(ErrorCode::Num)?;
    Ok((date.year(), date.month(), date.day()))
}

/// `DATE(year, month, day)`. Years 0-1899 are offset by 1900.
#[derive(Debug)]
pub struct DateFn;
impl Function for DateFn {
    func_caps!(PURE, ELEMENTWISE, NUMERIC_ONLY);
    fn name(&self) -> &'static str {
        "DATE"
    }
    fn biff_index(&self) -> Option<u16> {
        Some(65)
    }
    fn arity(&self) -> Arity {
        Arity::Fixed(3)
    }
    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        ctx: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        let year = args[0].integer()?;
        let month = args[1].integer()?;
        let day = args[2].integer()?;
        let year = match year {
            0..=1899 => year + 1900,
            1900..=9999 => year,
            _ => return Err(ErrorCode::Num),
        };
        ymd_to_serial(ctx.date_system(), year, month, day).map(Value::Number)
    }
}

fn date_part<'a, 'b>(
    args: &'a [ArgumentHandle<'a, 'b>],
    ctx: &dyn FunctionContext,
    pick: fn((i32, u32, u32)) -> f64,
) -> Result<Value, ErrorCode> {
    let serial = args[0].number()?;
    serial_to_ymd(ctx.date_system(), serial).map(|parts| Value::Number(pick(parts)))
}

#[derive(Debug)]
pub struct YearFn;
impl Function for YearFn {
    func_caps!(PURE, ELEMENTWISE, NUMERIC_ONLY);
    fn name(&self) -> &'static str {
        "YEAR"
    }
    fn biff_index(&self) -> Option<u16> {
        Some(69)
    }
    fn arity(&self) -> Arity {
        Arity::Fixed(1)
    }
    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        ctx: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        date_part(args, ctx, |(y, _, _)| f64::from(y))
    }
}

#[derive(Debug)]
pub struct MonthFn;
impl Function for MonthFn {
    func_caps!(PURE, ELEMENTWISE, NUMERIC_ONLY);
    fn name(&self) -> &'static str {
        "MONTH"
    }
    fn biff_index(&self) -> Option<u16> {
        Some(68)
    }
    fn arity(&self) -> Arity {
        Arity::Fixed(1)
    }
    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        ctx: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        date_part(args, ctx, |(_, m, _)| f64::from(m))
    }
}

#[derive(Debug)]
pub struct DayFn;
impl Function for DayFn {
    func_caps!(PURE, ELEMENTWISE, NUMERIC_ONLY);
    fn name(&self) -> &'static str {
        "DAY"
    }
    fn biff_index(&self) -> Option<u16> {
        Some(67)
    }
    fn arity(&self) -> Arity {
        Arity::Fixed(1)
    }
    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        ctx: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        date_part(args, ctx, |(_, _, d)| f64::from(d))
    }
}

pub fn register_builtins(registry: &mut FunctionRegistry) {
    register_functions!(registry; DateFn, YearFn, MonthFn, DayFn);
}
