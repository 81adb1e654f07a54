//! Reductions over any mix of scalars, references and arrays.

use gridcalc_common::{ErrorCode, ParamClass, Value};

use super::super::utils::collect_numbers;
use crate::args::ArgumentHandle;
use crate::coercion;
use crate::func_caps;
use crate::function::{Arity, Function};
use crate::function_registry::FunctionRegistry;
use crate::register_functions;
use crate::traits::FunctionContext;

#[derive(Debug)]
pub struct SumFn;
impl Function for SumFn {
    func_caps!(PURE, REDUCTION, NUMERIC_ONLY);
    fn name(&self) -> &'static str {
        "SUM"
    }
    fn biff_index(&self) -> Option<u16> {
        Some(4)
    }
    fn arity(&self) -> Arity {
        Arity::variadic(1)
    }
    fn param_class(&self, _: usize) -> ParamClass {
        ParamClass::Array
    }
    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        ctx: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        let nums = collect_numbers(args, ctx)?;
        Ok(Value::Number(nums.iter().sum()))
    }
}

#[derive(Debug)]
pub struct ProductFn;
impl Function for ProductFn {
    func_caps!(PURE, REDUCTION, NUMERIC_ONLY);
    fn name(&self) -> &'static str {
        "PRODUCT"
    }
    fn biff_index(&self) -> Option<u16> {
        Some(183)
    }
    fn arity(&self) -> Arity {
        Arity::variadic(1)
    }
    fn param_class(&self, _: usize) -> ParamClass {
        ParamClass::Array
    }
    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        ctx: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        let nums = collect_numbers(args, ctx)?;
        if nums.is_empty() {
            return Ok(Value::Number(0.0));
        }
        Ok(Value::Number(nums.iter().product()))
    }
}

#[derive(Debug)]
pub struct MinFn;
impl Function for MinFn {
    func_caps!(PURE, REDUCTION, NUMERIC_ONLY);
    fn name(&self) -> &'static str {
        "MIN"
    }
    fn biff_index(&self) -> Option<u16> {
        Some(6)
    }
    fn arity(&self) -> Arity {
        Arity::variadic(1)
    }
    fn param_class(&self, _: usize) -> ParamClass {
        ParamClass::Array
    }
    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        ctx: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        let nums = collect_numbers(args, ctx)?;
        Ok(Value::Number(
            nums.into_iter().reduce(f64::min).unwrap_or(0.0),
        ))
    }
}

#[derive(Debug)]
pub struct MaxFn;
impl Function for MaxFn {
    func_caps!(PURE, REDUCTION, NUMERIC_ONLY);
    fn name(&self) -> &'static str {
        "MAX"
    }
    fn biff_index(&self) -> Option<u16> {
        Some(7)
    }
    fn arity(&self) -> Arity {
        Arity::variadic(1)
    }
    fn param_class(&self, _: usize) -> ParamClass {
        ParamClass::Array
    }
    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        ctx: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        let nums = collect_numbers(args, ctx)?;
        Ok(Value::Number(
            nums.into_iter().reduce(f64::max).unwrap_or(0.0),
        ))
    }
}

#[derive(Debug)]
pub struct AverageFn;
impl Function for AverageFn {
    func_caps!(PURE, REDUCTION, NUMERIC_ONLY);
    fn name(&self) -> &'static str {
        "AVERAGE"
    }
    fn biff_index(&self) -> Option<u16> {
        Some(5)
    }
    fn arity(&self) -> Arity {
        Arity::variadic(1)
    }
    fn param_class(&self, _: usize) -> ParamClass {
        ParamClass::Array
    }
    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        ctx: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        let nums = collect_numbers(args, ctx)?;
        if nums.is_empty() {
            return Err(ErrorCode::DivZero);
        }
        Ok(Value::Number(nums.iter().sum::<f64>() / nums.len() as f64))
    }
}

/// Counts numbers. Never fails: errors and text are simply not counted.
#[derive(Debug)]
pub struct CountFn;
impl Function for CountFn {
    func_caps!(PURE, REDUCTION, ERROR_AWARE);
    fn name(&self) -> &'static str {
        "COUNT"
    }
    fn biff_index(&self) -> Option<u16> {
        Some(0)
    }
    fn arity(&self) -> Arity {
        Arity::variadic(0)
    }
    fn param_class(&self, _: usize) -> ParamClass {
        ParamClass::Array
    }
    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        ctx: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        let mut count = 0usize;
        for arg in args {
            if arg.is_missing() {
                continue;
            }
            if arg.is_direct_scalar() {
                let v = arg.value();
                if !v.is_error() && coercion::to_number(&v, ctx.locale()).is_ok() {
                    count += 1;
                }
                continue;
            }
            count += arg
                .flatten_populated()
                .iter()
                .filter(|v| matches!(v, Value::Number(_)))
                .count();
        }
        Ok(Value::Number(count as f64))
    }
}

/// Counts non-blank values, errors included.
#[derive(Debug)]
pub struct CountAFn;
impl Function for CountAFn {
    func_caps!(PURE, REDUCTION, ERROR_AWARE);
    fn name(&self) -> &'static str {
        "COUNTA"
    }
    fn biff_index(&self) -> Option<u16> {
        Some(169)
    }
    fn arity(&self) -> Arity {
        Arity::variadic(0)
    }
    fn param_class(&self, _: usize) -> ParamClass {
        ParamClass::Array
    }
    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        let count: usize = args
            .iter()
            .filter(|a| !a.is_missing())
            .map(|a| {
                if a.is_direct_scalar() {
                    1
                } else {
                    a.flatten_populated().iter().filter(|v| !v.is_blank()).count()
                }
            })
            .sum();
        Ok(Value::Number(count as f64))
    }
}

pub fn register_builtins(registry: &mut FunctionRegistry) {
    register_functions!(registry;
        SumFn, ProductFn, MinFn, MaxFn, AverageFn, CountFn, CountAFn
    );
}
