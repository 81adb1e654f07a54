use gridcalc_common::{ErrorCode, Value};

use super::super::utils::{checked_pow, round_half_away};
use crate::args::ArgumentHandle;
use crate::func_caps;
use crate::function::{Arity, Function};
use crate::register_functions;
use crate::function_registry::FunctionRegistry;
use crate::traits::FunctionContext;

fn number(n: f64) -> Result<Value, ErrorCode> {
    Ok(Value::Number(n))
}

#[derive(Debug)]
pub struct AbsFn;
impl Function for AbsFn {
    func_caps!(PURE, ELEMENTWISE, NUMERIC_ONLY);
    fn name(&self) -> &'static str {
        "ABS"
    }
    fn biff_index(&self) -> Option<u16> {
        Some(24)
    }
    fn arity(&self) -> Arity {
        Arity::Fixed(1)
    }
    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        number(args[0].number()?.abs())
    }
}

#[derive(Debug)]
pub struct IntFn; // floor toward -inf
impl Function for IntFn {
    func_caps!(PURE, ELEMENTWISE, NUMERIC_ONLY);
    fn name(&self) -> &'static str {
        "INT"
    }
    fn biff_index(&self) -> Option<u16> {
        Some(25)
    }
    fn arity(&self) -> Arity {
        Arity::Fixed(1)
    }
    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        number(args[0].number()?.floor())
    }
}

#[derive(Debug)]
pub struct SignFn;
impl Function for SignFn {
    func_caps!(PURE, ELEMENTWISE, NUMERIC_ONLY);
    fn name(&self) -> &'static str {
        "SIGN"
    }
    fn biff_index(&self) -> Option<u16> {
        Some(26)
    }
    fn arity(&self) -> Arity {
        Arity::Fixed(1)
    }
    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        let n = args[0].number()?;
        number(if n > 0.0 {
            1.0
        } else if n < 0.0 {
            -1.0
        } else {
            0.0
        })
    }
}

#[derive(Debug)]
pub struct RoundFn; // ROUND(number, digits)
impl Function for RoundFn {
    func_caps!(PURE, ELEMENTWISE, NUMERIC_ONLY);
    fn name(&self) -> &'static str {
        "ROUND"
    }
    fn biff_index(&self) -> Option<u16> {
        Some(27)
    }
    fn arity(&self) -> Arity {
        Arity::Fixed(2)
    }
    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        let n = args[0].number()?;
        let digits = args[1].integer()?.clamp(-308, 308) as i32;
        number(round_half_away(n, digits))
    }
}

#[derive(Debug)]
pub struct ModFn;
impl Function for ModFn {
    func_caps!(PURE, ELEMENTWISE, NUMERIC_ONLY);
    fn name(&self) -> &'static str {
        "MOD"
    }
    fn biff_index(&self) -> Option<u16> {
        Some(39)
    }
    fn arity(&self) -> Arity {
        Arity::Fixed(2)
    }
    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        let n = args[0].number()?;
        let d = args[1].number()?;
        if d == 0.0 {
            return Err(ErrorCode::DivZero);
        }
        // result takes the divisor's sign
        number(n - d * (n / d).floor())
    }
}

#[derive(Debug)]
pub struct SqrtFn;
impl Function for SqrtFn {
    func_caps!(PURE, ELEMENTWISE, NUMERIC_ONLY);
    fn name(&self) -> &'static str {
        "SQRT"
    }
    fn biff_index(&self) -> Option<u16> {
        Some(20)
    }
    fn arity(&self) -> Arity {
        Arity::Fixed(1)
    }
    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        let n = args[0].number()?;
        if n < 0.0 {
            return Err(ErrorCode::Num);
        }
        number(n.sqrt())
    }
}

#[derive(Debug)]
pub struct PowerFn;
impl Function for PowerFn {
    func_caps!(PURE, ELEMENTWISE, NUMERIC_ONLY);
    fn name(&self) -> &'static str {
        "POWER"
    }
    fn biff_index(&self) -> Option<u16> {
        Some(337)
    }
    fn arity(&self) -> Arity {
        Arity::Fixed(2)
    }
    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        let base = args[0].number()?;
        let exp = args[1].number()?;
        checked_pow(base, exp).map(Value::Number)
    }
}

#[derive(Debug)]
pub struct PiFn;
impl Function for PiFn {
    func_caps!(PURE);
    fn name(&self) -> &'static str {
        "PI"
    }
    fn biff_index(&self) -> Option<u16> {
        Some(19)
    }
    fn arity(&self) -> Arity {
        Arity::Fixed(0)
    }
    fn eval<'a, 'b>(
        &self,
        _: &'a [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        number(std::f64::consts::PI)
    }
}

/// Analysis ToolPak; addressed by name only.
#[derive(Debug)]
pub struct QuotientFn;
impl Function for QuotientFn {
    func_caps!(PURE, ELEMENTWISE, NUMERIC_ONLY);
    fn name(&self) -> &'static str {
        "QUOTIENT"
    }
    fn arity(&self) -> Arity {
        Arity::Fixed(2)
    }
    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        let n = args[0].number()?;
        let d = args[1].number()?;
        if d == 0.0 {
            return Err(ErrorCode::DivZero);
        }
        number((n / d).trunc())
    }
}

pub fn register_builtins(registry: &mut FunctionRegistry) {
    register_functions!(registry;
        AbsFn, IntFn, SignFn, RoundFn, ModFn, SqrtFn, PowerFn, PiFn, QuotientFn
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::test_support::{call, num};

    #[test]
    fn quotient_truncates_and_rejects_zero_divisor() {
        assert_eq!(call(&QuotientFn, &[num(10.0), num(3.0)]), num(3.0));
        assert_eq!(call(&QuotientFn, &[num(-10.0), num(3.0)]), num(-3.0));
        assert_eq!(
            call(&QuotientFn, &[num(10.0), num(0.0)]),
            Value::Error(ErrorCode::DivZero)
        );
    }

    #[test]
    fn mod_follows_divisor_sign() {
        assert_eq!(call(&ModFn, &[num(-3.0), num(2.0)]), num(1.0));
        assert_eq!(call(&ModFn, &[num(3.0), num(-2.0)]), num(-1.0));
        assert_eq!(
            call(&ModFn, &[num(1.0), num(0.0)]),
            Value::Error(ErrorCode::DivZero)
        );
    }

    #[test]
    fn int_floors_and_abs_coerces_text() {
        assert_eq!(call(&IntFn, &[num(-1.5)]), num(-2.0));
        assert_eq!(call(&AbsFn, &[Value::text("-4")]), num(4.0));
        assert_eq!(
            call(&AbsFn, &[Value::text("abc")]),
            Value::Error(ErrorCode::ValueInvalid)
        );
    }

    #[test]
    fn error_arguments_pass_through() {
        assert_eq!(
            call(&SqrtFn, &[Value::Error(ErrorCode::Ref)]),
            Value::Error(ErrorCode::Ref)
        );
        assert_eq!(
            call(&PowerFn, &[Value::Error(ErrorCode::NA), num(2.0)]),
            Value::Error(ErrorCode::NA)
        );
    }

    #[test]
    fn domain_errors() {
        assert_eq!(call(&SqrtFn, &[num(-1.0)]), Value::Error(ErrorCode::Num));
        assert_eq!(
            call(&PowerFn, &[num(-8.0), num(0.5)]),
            Value::Error(ErrorCode::Num)
        );
        assert_eq!(
            call(&PowerFn, &[num(0.0), num(-1.0)]),
            Value::Error(ErrorCode::DivZero)
        );
        assert_eq!(call(&PowerFn, &[num(1e200), num(10.0)]), Value::Error(ErrorCode::Num));
    }

    #[test]
    fn round_and_sign() {
        assert_eq!(call(&RoundFn, &[num(-2.5), num(0.0)]), num(-3.0));
        assert_eq!(call(&RoundFn, &[num(3.14159), num(2.0)]), num(3.14));
        assert_eq!(call(&SignFn, &[num(-0.1)]), num(-1.0));
        assert_eq!(call(&PiFn, &[]), num(std::f64::consts::PI));
    }

    #[test]
    fn round_keeps_large_numbers() {
        assert_eq!(call(&RoundFn, &[num(1e300), num(100.0)]), num(1e300));
        assert_eq!(call(&RoundFn, &[num(-7.5e250), num(-300.0)]), num(0.0));
        assert_eq!(
            call(&RoundFn, &[num(1.0), num(-9.223372036854775808e18)]),
            Value::Error(ErrorCode::Num)
        );
    }
}
