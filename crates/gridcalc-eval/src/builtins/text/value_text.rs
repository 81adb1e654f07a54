use gridcalc_common::{ErrorCode, Value};

use crate::args::ArgumentHandle;
use crate::func_caps;
use crate::function::{Arity, Function};
use crate::traits::FunctionContext;

/// `VALUE(text)`: text that reads as a number under the active locale.
#[derive(Debug)]
pub struct ValueFn;
impl Function for ValueFn {
    func_caps!(PURE, ELEMENTWISE);
    fn name(&self) -> &'static str {
        "VALUE"
    }
    fn biff_index(&self) -> Option<u16> {
        Some(33)
    }
    fn arity(&self) -> Arity {
        Arity::Fixed(1)
    }
    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        ctx: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        match args[0].value() {
            Value::Number(n) => Ok(Value::Number(n)),
            Value::Blank => Ok(Value::Number(0.0)),
            Value::Text(s) => ctx
                .locale()
                .parse_number(&s)
                .map(Value::Number)
                .ok_or(ErrorCode::ValueInvalid),
            Value::Error(e) => Err(e),
            _ => Err(ErrorCode::ValueInvalid),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::test_support::{call, call_in, num};
    use crate::args::Operand;
    use crate::engine::EvalConfig;
    use crate::locale::Locale;
    use crate::test_workbook::TestWorkbook;

    #[test]
    fn parses_numeric_text() {
        assert_eq!(call(&ValueFn, &[Value::text(" 1,234.5 ")]), num(1234.5));
        assert_eq!(call(&ValueFn, &[Value::text("12%")]), num(0.12));
        assert_eq!(
            call(&ValueFn, &[Value::text("TRUE")]),
            Value::Error(ErrorCode::ValueInvalid)
        );
        assert_eq!(
            call(&ValueFn, &[Value::Boolean(true)]),
            Value::Error(ErrorCode::ValueInvalid)
        );
    }

    #[test]
    fn honours_workbook_locale() {
        let config = EvalConfig::default().with_locale(Locale::new(',', Some('.')));
        let wb = TestWorkbook::new().with_config(config);
        let arg = Operand::from(Value::text("1.234,5"));
        assert_eq!(call_in(&wb, &ValueFn, &[arg]), num(1234.5));
    }
}
