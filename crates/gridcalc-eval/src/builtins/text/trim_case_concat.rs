use gridcalc_common::{ErrorCode, Value};

use super::super::utils::{count_arg, text_result};
use crate::args::ArgumentHandle;
use crate::func_caps;
use crate::function::{Arity, Function};
use crate::traits::FunctionContext;

/// Strips leading and trailing spaces and collapses inner runs to one.
#[derive(Debug)]
pub struct TrimFn;
impl Function for TrimFn {
    func_caps!(PURE, ELEMENTWISE);
    fn name(&self) -> &'static str {
        "TRIM"
    }
    fn biff_index(&self) -> Option<u16> {
        Some(118)
    }
    fn arity(&self) -> Arity {
        Arity::Fixed(1)
    }
    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        let text = args[0].text()?;
        let words: Vec<&str> = text.split(' ').filter(|w| !w.is_empty()).collect();
        Ok(Value::Text(words.join(" ")))
    }
}

#[derive(Debug)]
pub struct UpperFn;
impl Function for UpperFn {
    func_caps!(PURE, ELEMENTWISE);
    fn name(&self) -> &'static str {
        "UPPER"
    }
    fn biff_index(&self) -> Option<u16> {
        Some(113)
    }
    fn arity(&self) -> Arity {
        Arity::Fixed(1)
    }
    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        Ok(Value::Text(args[0].text()?.to_uppercase()))
    }
}

#[derive(Debug)]
pub struct LowerFn;
impl Function for LowerFn {
    func_caps!(PURE, ELEMENTWISE);
    fn name(&self) -> &'static str {
        "LOWER"
    }
    fn biff_index(&self) -> Option<u16> {
        Some(112)
    }
    fn arity(&self) -> Arity {
        Arity::Fixed(1)
    }
    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        Ok(Value::Text(args[0].text()?.to_lowercase()))
    }
}

#[derive(Debug)]
pub struct ConcatenateFn;
impl Function for ConcatenateFn {
    func_caps!(PURE, ELEMENTWISE);
    fn name(&self) -> &'static str {
        "CONCATENATE"
    }
    fn biff_index(&self) -> Option<u16> {
        Some(336)
    }
    fn arity(&self) -> Arity {
        Arity::variadic(1)
    }
    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        ctx: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        let mut out = String::new();
        for arg in args {
            out.push_str(&arg.text()?);
        }
        text_result(out, ctx)
    }
}

/// Case-sensitive equality.
#[derive(Debug)]
pub struct ExactFn;
impl Function for ExactFn {
    func_caps!(PURE, ELEMENTWISE);
    fn name(&self) -> &'static str {
        "EXACT"
    }
    fn biff_index(&self) -> Option<u16> {
        Some(117)
    }
    fn arity(&self) -> Arity {
        Arity::Fixed(2)
    }
    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        Ok(Value::Boolean(args[0].text()? == args[1].text()?))
    }
}

#[derive(Debug)]
pub struct ReptFn;
impl Function for ReptFn {
    func_caps!(PURE, ELEMENTWISE);
    fn name(&self) -> &'static str {
        "REPT"
    }
    fn biff_index(&self) -> Option<u16> {
        Some(30)
    }
    fn arity(&self) -> Arity {
        Arity::Fixed(2)
    }
    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        ctx: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        let text = args[0].text()?;
        let times = count_arg(&args[1], 0)?;
        let len = text.chars().count().saturating_mul(times);
        if len > ctx.version().max_text_length {
            return Err(ErrorCode::ValueInvalid);
        }
        text_result(text.repeat(times), ctx)
    }
}
