use gridcalc_common::{ErrorCode, Value};

use crate::args::ArgumentHandle;
use crate::coercion;
use crate::traits::FunctionContext;

/// Differences below this are treated as zero by the statistics functions.
pub const EPSILON_NEAR_ZERO: f64 = 1e-12;

/// Numbers of an aggregate's arguments, the way `SUM` sees them.
///
/// A scalar typed into the call is coerced (`SUM("2", TRUE)` is 3); text and
/// booleans met inside references or arrays are skipped. The first error
/// wins.
pub fn collect_numbers<'a, 'b>(
    args: &'a [ArgumentHandle<'a, 'b>],
    ctx: &dyn FunctionContext,
) -> Result<Vec<f64>, ErrorCode> {
    let mut out = Vec::new();
    for arg in args {
        if arg.is_missing() {
            continue;
        }
        if arg.is_direct_scalar() {
            out.push(coercion::to_number(&arg.value(), ctx.locale())?);
            continue;
        }
        for v in arg.flatten_populated() {
            match v {
                Value::Number(n) => out.push(n),
                Value::Error(e) => return Err(e),
                _ => {}
            }
        }
    }
    Ok(out)
}

/// Every element of one argument, as a numeric-or-not vector for the paired
/// statistics functions. Errors are kept in place.
pub fn element_vector<'a, 'b>(arg: &ArgumentHandle<'a, 'b>) -> Vec<Value> {
    if arg.is_direct_scalar() {
        vec![arg.value()]
    } else {
        arg.flatten()
    }
}

/// `ROUND` semantics: halves go away from zero.
pub fn round_half_away(n: f64, digits: i32) -> f64 {
    if n == 0.0 || !n.is_finite() {
        return n;
    }
    // past 15 significant digits there is nothing left to round
    let magnitude = n.abs().log10().floor() as i32;
    if digits >= 15 - magnitude {
        return n;
    }
    if digits < 0 && -digits > magnitude + 1 {
        return 0.0;
    }
    let factor = 10f64.powi(digits.abs());
    let scaled = if digits >= 0 { n * factor } else { n / factor };
    // nudge values like 2.675 that land just under the half in binary
    let nudged = scaled + scaled.signum() * scaled.abs() * f64::EPSILON * 4.0;
    let rounded = nudged.abs().round().copysign(n);
    if digits >= 0 {
        rounded / factor
    } else {
        rounded * factor
    }
}

/// `base ^ exp` with the spreadsheet's domain errors; shared by the `^`
/// operator and `POWER`.
pub fn checked_pow(base: f64, exp: f64) -> Result<f64, ErrorCode> {
    if base == 0.0 && exp == 0.0 {
        return Err(ErrorCode::Num);
    }
    if base == 0.0 && exp < 0.0 {
        return Err(ErrorCode::DivZero);
    }
    if base < 0.0 && exp.fract() != 0.0 {
        return Err(ErrorCode::Num);
    }
    coercion::sanitize_numeric(base.powf(exp))
}

/// Text result checked against the format's length ceiling.
pub fn text_result(s: String, ctx: &dyn FunctionContext) -> Result<Value, ErrorCode> {
    coercion::check_text_length(s, ctx.version()).map(Value::Text)
}

/// Integer argument at least `min`, else `#VALUE!`.
pub fn count_arg<'a, 'b>(arg: &ArgumentHandle<'a, 'b>, min: i64) -> Result<usize, ErrorCode> {
    let n = arg.integer()?;
    if n < min {
        return Err(ErrorCode::ValueInvalid);
    }
    usize::try_from(n).map_err(|_| ErrorCode::ValueInvalid)
}
