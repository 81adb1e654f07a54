use gridcalc_common::{ErrorCode, Value};

use super::super::utils::count_arg;
use crate::args::ArgumentHandle;
use crate::func_caps;
use crate::function::{Arity, Function};
use crate::traits::FunctionContext;

#[derive(Debug)]
pub struct LenFn;
impl Function for LenFn {
    func_caps!(PURE, ELEMENTWISE);
    fn name(&self) -> &'static str {
        "LEN"
    }
    fn biff_index(&self) -> Option<u16> {
        Some(32)
    }
    fn arity(&self) -> Arity {
        Arity::Fixed(1)
    }
    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        Ok(Value::Number(args[0].text()?.chars().count() as f64))
    }
}

/// Leading `n` characters (default 1); `n` past the end takes everything.
fn take_count<'a, 'b>(args: &'a [ArgumentHandle<'a, 'b>]) -> Result<(Vec<char>, usize), ErrorCode> {
    let chars: Vec<char> = args[0].text()?.chars().collect();
    let n = match args.get(1) {
        Some(a) if !a.is_missing() => count_arg(a, 0)?,
        _ => 1,
    };
    Ok((chars, n))
}

#[derive(Debug)]
pub struct LeftFn;
impl Function for LeftFn {
    func_caps!(PURE, ELEMENTWISE);
    fn name(&self) -> &'static str {
        "LEFT"
    }
    fn biff_index(&self) -> Option<u16> {
        Some(115)
    }
    fn arity(&self) -> Arity {
        Arity::between(1, 2)
    }
    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        let (chars, n) = take_count(args)?;
        Ok(Value::Text(chars.iter().take(n).collect()))
    }
}

#[derive(Debug)]
pub struct RightFn;
impl Function for RightFn {
    func_caps!(PURE, ELEMENTWISE);
    fn name(&self) -> &'static str {
        "RIGHT"
    }
    fn biff_index(&self) -> Option<u16> {
        Some(116)
    }
    fn arity(&self) -> Arity {
        Arity::between(1, 2)
    }
    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        let (chars, n) = take_count(args)?;
        let start = chars.len().saturating_sub(n);
        Ok(Value::Text(chars[start..].iter().collect()))
    }
}
