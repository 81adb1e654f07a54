use gridcalc_common::{ErrorCode, Value};

use super::super::utils::{count_arg, text_result};
use crate::args::ArgumentHandle;
use crate::func_caps;
use crate::function::{Arity, Function};
use crate::traits::FunctionContext;

// MID(text, start_num, num_chars)
#[derive(Debug)]
pub struct MidFn;
impl Function for MidFn {
    func_caps!(PURE, ELEMENTWISE);
    fn name(&self) -> &'static str {
        "MID"
    }
    fn biff_index(&self) -> Option<u16> {
        Some(31)
    }
    fn arity(&self) -> Arity {
        Arity::Fixed(3)
    }
    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        let chars: Vec<char> = args[0].text()?.chars().collect();
        let start = count_arg(&args[1], 1)?;
        let count = count_arg(&args[2], 0)?;
        if start > chars.len() {
            return Ok(Value::Text(String::new()));
        }
        Ok(Value::Text(
            chars[start - 1..].iter().take(count).collect(),
        ))
    }
}

// SUBSTITUTE(text, old_text, new_text, [instance_num])
#[derive(Debug)]
pub struct SubstituteFn;
impl Function for SubstituteFn {
    func_caps!(PURE, ELEMENTWISE);
    fn name(&self) -> &'static str {
        "SUBSTITUTE"
    }
    fn biff_index(&self) -> Option<u16> {
        Some(120)
    }
    fn arity(&self) -> Arity {
        Arity::between(3, 4)
    }
    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        ctx: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        let text = args[0].text()?;
        let old = args[1].text()?;
        let new = args[2].text()?;
        let instance = match args.get(3) {
            Some(a) if !a.is_missing() => Some(count_arg(a, 1)?),
            _ => None,
        };
        if old.is_empty() {
            return Ok(Value::Text(text));
        }
        let out = match instance {
            None => text.replace(&old, &new),
            Some(n) => match text.match_indices(&old).nth(n - 1) {
                Some((pos, _)) => {
                    let mut out = String::with_capacity(text.len() + new.len());
                    out.push_str(&text[..pos]);
                    out.push_str(&new);
                    out.push_str(&text[pos + old.len()..]);
                    out
                }
                None => text,
            },
        };
        text_result(out, ctx)
    }
}

// REPLACE(old_text, start_num, num_chars, new_text)
#[derive(Debug)]
pub struct ReplaceFn;
impl Function for ReplaceFn {
    func_caps!(PURE, ELEMENTWISE);
    fn name(&self) -> &'static str {
        "REPLACE"
    }
    fn biff_index(&self) -> Option<u16> {
        Some(119)
    }
    fn arity(&self) -> Arity {
        Arity::Fixed(4)
    }
    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        ctx: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode> {
        let mut chars: Vec<char> = args[0].text()?.chars().collect();
        let start = count_arg(&args[1], 1)?;
        let count = count_arg(&args[2], 0)?;
        let new = args[3].text()?;
        let from = (start - 1).min(chars.len());
        let to = from.saturating_add(count).min(chars.len());
        chars.splice(from..to, new.chars());
        text_result(chars.into_iter().collect(), ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::test_support::{call, num};

    fn t(s: &str) -> Value {
        Value::text(s)
    }

    #[test]
    fn substitute_all_occurrences() {
        assert_eq!(
            call(&SubstituteFn, &[t("hello world"), t("world"), t("there")]),
            t("hello there")
        );
        assert_eq!(call(&SubstituteFn, &[t("aaa"), t("a"), t("bb")]), t("bbbbbb"));
    }

    #[test]
    fn substitute_nth_occurrence() {
        assert_eq!(
            call(&SubstituteFn, &[t("aaa"), t("a"), t("b"), num(2.0)]),
            t("aba")
        );
        assert_eq!(
            call(&SubstituteFn, &[t("aaa"), t("a"), t("b"), num(4.0)]),
            t("aaa")
        );
        assert_eq!(
            call(&SubstituteFn, &[t("aaa"), t("a"), t("b"), num(0.0)]),
            Value::Error(ErrorCode::ValueInvalid)
        );
    }

    #[test]
    fn substitute_empty_pattern_is_identity() {
        assert_eq!(call(&SubstituteFn, &[t("abc"), t(""), t("x")]), t("abc"));
    }

    #[test]
    fn mid_bounds() {
        assert_eq!(call(&MidFn, &[t("spreadsheet"), num(7.0), num(5.0)]), t("sheet"));
        assert_eq!(call(&MidFn, &[t("abc"), num(5.0), num(2.0)]), t(""));
        assert_eq!(
            call(&MidFn, &[t("abc"), num(0.0), num(2.0)]),
            Value::Error(ErrorCode::ValueInvalid)
        );
    }

    #[test]
    fn replace_splices_by_position() {
        assert_eq!(
            call(&ReplaceFn, &[t("abcdef"), num(3.0), num(2.0), t("XY")]),
            t("abXYef")
        );
        assert_eq!(call(&ReplaceFn, &[t("abc"), num(10.0), num(1.0), t("!")]), t("abc!"));
    }
}
