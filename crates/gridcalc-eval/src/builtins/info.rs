//! `IS*` predicates, `NA()` and `ERROR.TYPE`. None of these let an error
//! argument escape as their own result.

use gridcalc_common::{ErrorCode, ParamClass, Value};

use crate::args::ArgumentHandle;
use crate::func_caps;
use crate::function::{Arity, Function};
use crate::function_registry::FunctionRegistry;
use crate::register_functions;
use crate::traits::FunctionContext;

/// One-argument predicate over the argument's scalar value.
macro_rules! value_predicate {
    ($ty:ident, $name:literal, $index:literal, $pred:expr) => {
        #[derive(Debug)]
        pub struct $ty;
        impl Function for $ty {
            func_caps!(PURE, ELEMENTWISE, ERROR_AWARE);
            fn name(&self) -> &'static str {
                $name
            }
            fn biff_index(&self) -> Option<u16> {
                Some($index)
            }
            fn arity(&self) -> Arity {
                Arity::Fixed(1)
            }
            fn eval<'a, 'b>(
                &self,
                args: &'a [ArgumentHandle<'a, 'b>],
                _: &dyn FunctionContext,
            ) -> Result<Value, ErrorCode> {
                let pred: fn(&Value) -> bool = $pred;
                Ok(Value::Boolean(pred(&args[0].value())))
            }
        }
    };
}

value_predicate!(IsErrorFn, "ISERROR", 3, |v| v.is_error());
value_predicate!(IsErrFn, "ISERR", 126, |v| v
    .error()
    .is_some_and(|e| e != ErrorCode::NA));
value_predicate!(IsNaFn, "ISNA", 2, |v| v.error() == Some(ErrorCode::NA));
value_predicate!(IsBlankFn, "ISBLANK", 129, |v| v.is_blank());
value_predicate!(IsNumberFn, "ISNUMBER", 128, |v| matches!(v, Value::Number(_)));
value_predicate!(IsTextFn, "ISTEXT", 127, |v| matches!(v, Value::Text(_)));
value_predicate!(IsNonTextFn, "ISNONTEXT", 190, |v| !matches!(v, Value::Text(_)));
value_predicate!(IsLogicalFn, "ISLOGICAL", 198, |v| matches!(v, Value::Boolean(_)));

#[derive(Debug)]
pub struct IsRefFn;
impl Function for IsRefFn {
    func_caps!(PURE, BY_REF, ERROR_AWARE);
    fn name(&self) -> &'static str {
        "ISREF"
    }
    fn biff_index(&self) -> Option<u16> {
        Some(105)
    }
    fn arity(&self) -> Arity {
        Arity::Fixed(1)
    }
    fn param_class(&self, _: usize) -> ParamClass {
        ParamClass::Reference
    }
    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        Ok(Value::Boolean(args[0].reference().is_some()))
    }
}

#[derive(Debug)]
pub struct NaFn;
impl Function for NaFn {
    func_caps!(PURE);
    fn name(&self) -> &'static str {
        "NA"
    }
    fn biff_index(&self) -> Option<u16> {
        Some(10)
    }
    fn arity(&self) -> Arity {
        Arity::Fixed(0)
    }
    fn eval<'a, 'b>(
        &self,
        _: &'a [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        Err(ErrorCode::NA)
    }
}

/// `ERROR.TYPE(value)`: 1 for `#NULL!` through 8 for `#GETTING_DATA`;
/// `#N/A` for anything that is not an error.
#[derive(Debug)]
pub struct ErrorTypeFn;
impl Function for ErrorTypeFn {
    func_caps!(PURE, ELEMENTWISE, ERROR_AWARE);
    fn name(&self) -> &'static str {
        "ERROR.TYPE"
    }
    fn biff_index(&self) -> Option<u16> {
        Some(261)
    }
    fn arity(&self) -> Arity {
        Arity::Fixed(1)
    }
    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        args[0]
            .value()
            .error()
            .and_then(ErrorCode::error_type_number)
            .map(|n| Value::Number(f64::from(n)))
            .ok_or(ErrorCode::NA)
    }
}

pub fn register_builtins(registry: &mut FunctionRegistry) {
    register_functions!(registry;
        IsErrorFn, IsErrFn, IsNaFn, IsBlankFn, IsNumberFn, IsTextFn, IsNonTextFn,
        IsLogicalFn, IsRefFn, NaFn, ErrorTypeFn
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::Operand;
    use crate::builtins::test_support::{call, call_in, num};
    use crate::test_workbook::TestWorkbook;
    use gridcalc_common::CellRef;

    #[test]
    fn error_predicates_swallow_errors() {
        let na = Value::Error(ErrorCode::NA);
        let div = Value::Error(ErrorCode::DivZero);
        assert_eq!(call(&IsErrorFn, &[na.clone()]), Value::Boolean(true));
        assert_eq!(call(&IsErrFn, &[na.clone()]), Value::Boolean(false));
        assert_eq!(call(&IsErrFn, &[div.clone()]), Value::Boolean(true));
        assert_eq!(call(&IsNaFn, &[na]), Value::Boolean(true));
        assert_eq!(call(&IsNaFn, &[div]), Value::Boolean(false));
    }

    #[test]
    fn type_predicates() {
        assert_eq!(call(&IsNumberFn, &[num(1.0)]), Value::Boolean(true));
        assert_eq!(call(&IsNumberFn, &[Value::text("1")]), Value::Boolean(false));
        assert_eq!(call(&IsTextFn, &[Value::text("")]), Value::Boolean(true));
        assert_eq!(call(&IsNonTextFn, &[Value::Blank]), Value::Boolean(true));
        assert_eq!(call(&IsLogicalFn, &[Value::Boolean(false)]), Value::Boolean(true));
    }

    #[test]
    fn isblank_and_isref_read_the_reference() {
        let wb = TestWorkbook::new().with_value("Sheet1", "A1", "");
        let a1 = Operand::from(CellRef::new(0, 0, 0));
        let b1 = Operand::from(CellRef::new(0, 0, 1));
        assert_eq!(call_in(&wb, &IsBlankFn, &[a1.clone()]), Value::Boolean(false));
        assert_eq!(call_in(&wb, &IsBlankFn, &[b1]), Value::Boolean(true));
        assert_eq!(call_in(&wb, &IsRefFn, &[a1]), Value::Boolean(true));
        assert_eq!(call(&IsRefFn, &[num(1.0)]), Value::Boolean(false));
    }

    #[test]
    fn error_type_numbers() {
        assert_eq!(call(&ErrorTypeFn, &[Value::Error(ErrorCode::Null)]), num(1.0));
        assert_eq!(call(&ErrorTypeFn, &[Value::Error(ErrorCode::NA)]), num(7.0));
        assert_eq!(
            call(&ErrorTypeFn, &[num(5.0)]),
            Value::Error(ErrorCode::NA)
        );
        assert_eq!(call(&NaFn, &[]), Value::Error(ErrorCode::NA));
    }
}
