//! Paired-sample regression statistics.

use gridcalc_common::{ErrorCode, ParamClass, Value};

use super::utils::{EPSILON_NEAR_ZERO, element_vector};
use crate::args::ArgumentHandle;
use crate::func_caps;
use crate::function::{Arity, Function};
use crate::function_registry::FunctionRegistry;
use crate::register_functions;
use crate::traits::FunctionContext;

/// Centered sums over the numeric pairs of two vectors.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PairSums {
    x_mean: f64,
    y_mean: f64,
    /// Σ(x - x̄)(y - ȳ)
    sxy: f64,
    /// Σ(x - x̄)²
    sxx: f64,
    /// Σ(y - ȳ)²
    syy: f64,
}

/// Two-pass accumulation. Pass one finds the means, skipping any index where
/// either side is not a number and stopping at the first error on either
/// side. Pass two accumulates the centered products.
fn pair_sums(ys: &[Value], xs: &[Value]) -> Result<PairSums, ErrorCode> {
    if xs.len() != ys.len() {
        return Err(ErrorCode::NA);
    }
    let mut pairs = Vec::with_capacity(xs.len());
    let (mut x_sum, mut y_sum) = (0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        if let Value::Error(e) = x {
            return Err(*e);
        }
        if let Value::Error(e) = y {
            return Err(*e);
        }
        if let (Value::Number(x), Value::Number(y)) = (x, y) {
            x_sum += x;
            y_sum += y;
            pairs.push((*x, *y));
        }
    }
    if pairs.is_empty() {
        return Err(ErrorCode::DivZero);
    }
    let n = pairs.len() as f64;
    let (x_mean, y_mean) = (x_sum / n, y_sum / n);
    let mut sums = PairSums {
        x_mean,
        y_mean,
        sxy: 0.0,
        sxx: 0.0,
        syy: 0.0,
    };
    for (x, y) in pairs {
        let (dx, dy) = (x - x_mean, y - y_mean);
        sums.sxy += dx * dy;
        sums.sxx += dx * dx;
        sums.syy += dy * dy;
    }
    Ok(sums)
}

fn slope_of(sums: &PairSums) -> Result<f64, ErrorCode> {
    if sums.sxx == 0.0 {
        return Err(ErrorCode::DivZero);
    }
    Ok(sums.sxy / sums.sxx)
}

fn sums_for<'a, 'b>(args: &'a [ArgumentHandle<'a, 'b>]) -> Result<PairSums, ErrorCode> {
    let ys = element_vector(&args[0]);
    let xs = element_vector(&args[1]);
    pair_sums(&ys, &xs)
}

/// `SLOPE(known_ys, known_xs)`
#[derive(Debug)]
pub struct SlopeFn;
impl Function for SlopeFn {
    func_caps!(PURE, REDUCTION, NUMERIC_ONLY);
    fn name(&self) -> &'static str {
        "SLOPE"
    }
    fn biff_index(&self) -> Option<u16> {
        Some(315)
    }
    fn arity(&self) -> Arity {
        Arity::Fixed(2)
    }
    fn param_class(&self, _: usize) -> ParamClass {
        ParamClass::Array
    }
    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        let sums = sums_for(args)?;
        slope_of(&sums).map(Value::Number)
    }
}

/// `INTERCEPT(known_ys, known_xs)`
#[derive(Debug)]
pub struct InterceptFn;
impl Function for InterceptFn {
    func_caps!(PURE, REDUCTION, NUMERIC_ONLY);
    fn name(&self) -> &'static str {
        "INTERCEPT"
    }
    fn biff_index(&self) -> Option<u16> {
        Some(311)
    }
    fn arity(&self) -> Arity {
        Arity::Fixed(2)
    }
    fn param_class(&self, _: usize) -> ParamClass {
        ParamClass::Array
    }
    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        let sums = sums_for(args)?;
        let beta1 = slope_of(&sums)?;
        Ok(Value::Number(sums.y_mean - beta1 * sums.x_mean))
    }
}

/// `CORREL(array1, array2)`; symmetric in its arguments.
#[derive(Debug)]
pub struct CorrelFn;
impl Function for CorrelFn {
    func_caps!(PURE, REDUCTION, NUMERIC_ONLY);
    fn name(&self) -> &'static str {
        "CORREL"
    }
    fn biff_index(&self) -> Option<u16> {
        Some(307)
    }
    fn arity(&self) -> Arity {
        Arity::Fixed(2)
    }
    fn param_class(&self, _: usize) -> ParamClass {
        ParamClass::Array
    }
    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        let sums = sums_for(args)?;
        let denom = (sums.sxx * sums.syy).sqrt();
        if denom < EPSILON_NEAR_ZERO {
            return Err(ErrorCode::DivZero);
        }
        Ok(Value::Number(sums.sxy / denom))
    }
}

pub fn register_builtins(registry: &mut FunctionRegistry) {
    register_functions!(registry; SlopeFn, InterceptFn, CorrelFn);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::Operand;
    use crate::builtins::test_support::{call, call_in, num};
    use crate::reference::ResolvedRef;
    use crate::test_workbook::TestWorkbook;
    use gridcalc_common::{AreaRef, ArrayValue};

    fn row(values: &[f64]) -> Value {
        Value::Array(ArrayValue::from_rows(vec![values.iter().map(|v| num(*v)).collect()]).unwrap())
    }

    #[test]
    fn perfect_line() {
        let ys = row(&[2.0, 4.0, 6.0, 8.0]);
        let xs = row(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(call(&SlopeFn, &[ys.clone(), xs.clone()]), num(2.0));
        assert_eq!(call(&InterceptFn, &[ys.clone(), xs.clone()]), num(0.0));
        assert_eq!(call(&CorrelFn, &[ys, xs]), num(1.0));
    }

    #[test]
    fn offset_line_from_references() {
        let wb = TestWorkbook::new()
            .with_range(
                "Sheet1",
                "A1",
                vec![
                    vec![num(1.0), num(5.0)],
                    vec![num(2.0), num(7.0)],
                    vec![num(3.0), num(9.0)],
                ],
            );
        let xs = Operand::Ref(ResolvedRef::from_area(AreaRef::parse_a1(0, "A1:A3").unwrap()));
        let ys = Operand::Ref(ResolvedRef::from_area(AreaRef::parse_a1(0, "B1:B3").unwrap()));
        assert_eq!(call_in(&wb, &SlopeFn, &[ys.clone(), xs.clone()]), num(2.0));
        assert_eq!(call_in(&wb, &InterceptFn, &[ys, xs]), num(3.0));
    }

    #[test]
    fn non_numeric_pairs_are_skipped() {
        let ys = Value::Array(
            ArrayValue::from_rows(vec![vec![num(2.0), Value::text("x"), num(6.0)]]).unwrap(),
        );
        let xs = row(&[1.0, 100.0, 3.0]);
        assert_eq!(call(&SlopeFn, &[ys, xs]), num(2.0));
    }

    #[test]
    fn first_error_wins() {
        let ys = Value::Array(
            ArrayValue::from_rows(vec![vec![
                num(1.0),
                Value::Error(ErrorCode::Ref),
                Value::Error(ErrorCode::NA),
            ]])
            .unwrap(),
        );
        let xs = row(&[1.0, 2.0, 3.0]);
        assert_eq!(call(&SlopeFn, &[ys, xs]), Value::Error(ErrorCode::Ref));
    }

    #[test]
    fn degenerate_inputs() {
        assert_eq!(
            call(&SlopeFn, &[row(&[1.0, 2.0]), row(&[3.0, 3.0])]),
            Value::Error(ErrorCode::DivZero)
        );
        assert_eq!(
            call(&SlopeFn, &[row(&[1.0, 2.0]), row(&[1.0, 2.0, 3.0])]),
            Value::Error(ErrorCode::NA)
        );
        let texts = Value::Array(ArrayValue::from_rows(vec![vec![Value::text("a")]]).unwrap());
        assert_eq!(
            call(&InterceptFn, &[texts.clone(), texts]),
            Value::Error(ErrorCode::DivZero)
        );
    }
}
