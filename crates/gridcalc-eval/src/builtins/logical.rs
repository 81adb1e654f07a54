use gridcalc_common::{ErrorCode, ParamClass, Value};

use super::utils::count_arg;
use crate::args::ArgumentHandle;
use crate::func_caps;
use crate::function::{Arity, Function};
use crate::function_registry::FunctionRegistry;
use crate::register_functions;
use crate::traits::FunctionContext;

/* ─────────────────────────── TRUE() / FALSE() ───────────────────────────── */

#[derive(Debug)]
pub struct TrueFn;
impl Function for TrueFn {
    func_caps!(PURE);
    fn name(&self) -> &'static str {
        "TRUE"
    }
    fn biff_index(&self) -> Option<u16> {
        Some(34)
    }
    fn arity(&self) -> Arity {
        Arity::Fixed(0)
    }
    fn eval<'a, 'b>(
        &self,
        _: &'a [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        Ok(Value::Boolean(true))
    }
}

#[derive(Debug)]
pub struct FalseFn;
impl Function for FalseFn {
    func_caps!(PURE);
    fn name(&self) -> &'static str {
        "FALSE"
    }
    fn biff_index(&self) -> Option<u16> {
        Some(35)
    }
    fn arity(&self) -> Arity {
        Arity::Fixed(0)
    }
    fn eval<'a, 'b>(
        &self,
        _: &'a [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        Ok(Value::Boolean(false))
    }
}

/* ─────────────────────────────── AND() / OR() ────────────────────────────── */

/// Truth values of every argument. Direct scalars are coerced; inside
/// references and arrays only numbers and booleans count. `#VALUE!` when
/// nothing counted.
fn truth_values<'a, 'b>(args: &'a [ArgumentHandle<'a, 'b>]) -> Result<Vec<bool>, ErrorCode> {
    let mut out = Vec::with_capacity(args.len());
    for arg in args {
        if arg.is_missing() {
            continue;
        }
        if arg.is_direct_scalar() {
            out.push(arg.boolean()?);
            continue;
        }
        for v in arg.flatten_populated() {
            match v {
                Value::Boolean(b) => out.push(b),
                Value::Number(n) => out.push(n != 0.0),
                Value::Error(e) => return Err(e),
                _ => {}
            }
        }
    }
    if out.is_empty() {
        return Err(ErrorCode::ValueInvalid);
    }
    Ok(out)
}

#[derive(Debug)]
pub struct AndFn;
impl Function for AndFn {
    func_caps!(PURE, REDUCTION);
    fn name(&self) -> &'static str {
        "AND"
    }
    fn biff_index(&self) -> Option<u16> {
        Some(36)
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
        _: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        Ok(Value::Boolean(truth_values(args)?.into_iter().all(|b| b)))
    }
}

#[derive(Debug)]
pub struct OrFn;
impl Function for OrFn {
    func_caps!(PURE, REDUCTION);
    fn name(&self) -> &'static str {
        "OR"
    }
    fn biff_index(&self) -> Option<u16> {
        Some(37)
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
        _: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        Ok(Value::Boolean(truth_values(args)?.into_iter().any(|b| b)))
    }
}

#[derive(Debug)]
pub struct NotFn;
impl Function for NotFn {
    func_caps!(PURE, ELEMENTWISE);
    fn name(&self) -> &'static str {
        "NOT"
    }
    fn biff_index(&self) -> Option<u16> {
        Some(38)
    }
    fn arity(&self) -> Arity {
        Arity::Fixed(1)
    }
    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        Ok(Value::Boolean(!args[0].boolean()?))
    }
}

/* ─────────────────────────── IF() / IFERROR() ───────────────────────────── */

/// Eager `IF`. Formulas that carry jump tokens never reach it with a false
/// condition and no third argument; the interpreter settles those itself.
#[derive(Debug)]
pub struct IfFn;
impl Function for IfFn {
    func_caps!(PURE, ELEMENTWISE);
    fn name(&self) -> &'static str {
        "IF"
    }
    fn biff_index(&self) -> Option<u16> {
        Some(1)
    }
    fn arity(&self) -> Arity {
        Arity::between(2, 3)
    }
    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        if args[0].boolean()? {
            Ok(args[1].value())
        } else if let Some(otherwise) = args.get(2) {
            Ok(otherwise.value())
        } else {
            Ok(Value::Boolean(false))
        }
    }
}

#[derive(Debug)]
pub struct IfErrorFn;
impl Function for IfErrorFn {
    func_caps!(PURE, ELEMENTWISE, ERROR_AWARE);
    fn name(&self) -> &'static str {
        "IFERROR"
    }
    fn biff_index(&self) -> Option<u16> {
        Some(480)
    }
    fn arity(&self) -> Arity {
        Arity::Fixed(2)
    }
    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        match args[0].value() {
            Value::Error(_) => Ok(args[1].value()),
            v => Ok(v),
        }
    }
}

/// `CHOOSE(index, value1, ...)`: the index is truncated; out of range is
/// `#VALUE!`. A chosen area comes back whole.
#[derive(Debug)]
pub struct ChooseFn;
impl Function for ChooseFn {
    func_caps!(PURE, ELEMENTWISE);
    fn name(&self) -> &'static str {
        "CHOOSE"
    }
    fn biff_index(&self) -> Option<u16> {
        Some(100)
    }
    fn arity(&self) -> Arity {
        Arity::variadic(2)
    }
    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        let idx = count_arg(&args[0], 1)?;
        args.get(idx)
            .map(|a| a.grid())
            .ok_or(ErrorCode::ValueInvalid)
    }
}

pub fn register_builtins(registry: &mut FunctionRegistry) {
    register_functions!(registry;
        TrueFn, FalseFn, AndFn, OrFn, NotFn, IfFn, IfErrorFn, ChooseFn
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::Operand;
    use crate::builtins::test_support::{call, call_in, num};
    use crate::reference::ResolvedRef;
    use crate::test_workbook::TestWorkbook;
    use gridcalc_common::AreaRef;

    #[test]
    fn and_or_over_scalars() {
        assert_eq!(
            call(&AndFn, &[Value::Boolean(true), num(1.0)]),
            Value::Boolean(true)
        );
        assert_eq!(
            call(&OrFn, &[Value::Boolean(false), Value::text("TRUE")]),
            Value::Boolean(true)
        );
        assert_eq!(
            call(&AndFn, &[Value::text("yes")]),
            Value::Error(ErrorCode::ValueInvalid)
        );
    }

    #[test]
    fn and_skips_text_in_references() {
        let wb = TestWorkbook::new()
            .with_value("Sheet1", "A1", true)
            .with_value("Sheet1", "A2", "note")
            .with_value("Sheet1", "A3", 0.0);
        let area = Operand::Ref(ResolvedRef::from_area(AreaRef::parse_a1(0, "A1:A3").unwrap()));
        assert_eq!(call_in(&wb, &AndFn, &[area.clone()]), Value::Boolean(false));
        assert_eq!(call_in(&wb, &OrFn, &[area]), Value::Boolean(true));
        let empty = Operand::Ref(ResolvedRef::from_area(AreaRef::parse_a1(0, "C1:C3").unwrap()));
        assert_eq!(
            call_in(&wb, &OrFn, &[empty]),
            Value::Error(ErrorCode::ValueInvalid)
        );
    }

    #[test]
    fn eager_if_branches() {
        assert_eq!(call(&IfFn, &[Value::Boolean(true), num(1.0), num(2.0)]), num(1.0));
        assert_eq!(call(&IfFn, &[num(0.0), num(1.0), num(2.0)]), num(2.0));
        assert_eq!(call(&IfFn, &[num(0.0), num(1.0)]), Value::Boolean(false));
        assert_eq!(
            call(&IfFn, &[Value::Error(ErrorCode::NA), num(1.0)]),
            Value::Error(ErrorCode::NA)
        );
    }

    #[test]
    fn iferror_and_choose() {
        assert_eq!(
            call(&IfErrorFn, &[Value::Error(ErrorCode::DivZero), Value::text("n/a")]),
            Value::text("n/a")
        );
        assert_eq!(call(&IfErrorFn, &[num(3.0), num(0.0)]), num(3.0));
        assert_eq!(
            call(&ChooseFn, &[num(2.9), Value::text("a"), Value::text("b")]),
            Value::text("b")
        );
        assert_eq!(
            call(&ChooseFn, &[num(3.0), Value::text("a"), Value::text("b")]),
            Value::Error(ErrorCode::ValueInvalid)
        );
        assert_eq!(call(&NotFn, &[num(0.0)]), Value::Boolean(true));
    }

    #[test]
    fn choose_hands_back_the_whole_area() {
        use crate::token::Token;

        let wb = TestWorkbook::new()
            .with_value("Sheet1", "A1", 1.0)
            .with_value("Sheet1", "A2", 2.0)
            .with_value("Sheet1", "A3", 3.0)
            .with_value("Sheet1", "B1", 10.0)
            .with_formula(
                "Sheet1",
                "C1",
                vec![
                    Token::Number(2.0),
                    Token::area_a1("B1:B2").unwrap(),
                    Token::area_a1("A1:A3").unwrap(),
                    Token::call("CHOOSE", 3),
                    Token::call("SUM", 1),
                ],
            )
            .with_formula(
                "Sheet1",
                "C2",
                vec![
                    Token::Number(2.0),
                    Token::area_a1("A1:A3").unwrap(),
                    Token::call("CHOOSE", 2),
                ],
            );
        let c1 = wb.cell_ref("Sheet1", "C1");
        let c2 = wb.cell_ref("Sheet1", "C2");
        let eval = wb.evaluator();
        assert_eq!(eval.evaluate_cell(c1).unwrap(), num(6.0));
        assert_eq!(eval.evaluate_cell(c2).unwrap(), Value::Error(ErrorCode::ValueInvalid));
    }
}
