//! The `Function` trait, its capability flags and calling conventions.

use gridcalc_common::{ErrorCode, ParamClass, Value};

use crate::args::ArgumentHandle;
use crate::traits::FunctionContext;

bitflags::bitflags! {
    /// Describes the capabilities and properties of a function.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct FnCaps: u16 {
        /// Same output for the same input, no side effects.
        const PURE          = 0b0000_0001;
        /// Output may change between calls with identical inputs.
        const VOLATILE      = 0b0000_0010;
        /// Reduces its inputs to one value (`SUM`, `AVERAGE`).
        const REDUCTION     = 0b0000_0100;
        /// Operates on each element independently (`ABS`, `LEN`). In array
        /// context the dispatcher broadcasts Value-class arguments and calls
        /// the scalar path once per element.
        const ELEMENTWISE   = 0b0000_1000;
        /// Needs references rather than values for some argument.
        const BY_REF        = 0b0001_0000;
        /// Sees error arguments as values instead of short-circuiting.
        const ERROR_AWARE   = 0b0010_0000;
        /// Works on numbers only.
        const NUMERIC_ONLY  = 0b0100_0000;
    }
}

/// Calling convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Fixed(usize),
    /// `max = None` is variadic, bounded only by the format's argument ceiling.
    Range { min: usize, max: Option<usize> },
}

impl Arity {
    pub const fn variadic(min: usize) -> Self {
        Arity::Range { min, max: None }
    }

    pub const fn between(min: usize, max: usize) -> Self {
        Arity::Range {
            min,
            max: Some(max),
        }
    }

    pub fn min(&self) -> usize {
        match *self {
            Arity::Fixed(n) => n,
            Arity::Range { min, .. } => min,
        }
    }

    /// Largest accepted argument count under a format ceiling.
    pub fn max(&self, ceiling: usize) -> usize {
        match *self {
            Arity::Fixed(n) => n,
            Arity::Range { max: Some(m), .. } => m.min(ceiling),
            Arity::Range { max: None, .. } => ceiling,
        }
    }

    pub fn accepts(&self, argc: usize, ceiling: usize) -> bool {
        argc >= self.min() && argc <= self.max(ceiling)
    }

    /// Argument count for a call token that carries none.
    pub fn fixed_count(&self) -> Option<usize> {
        match *self {
            Arity::Fixed(n) => Some(n),
            Arity::Range { min, max: Some(max) } if min == max => Some(min),
            Arity::Range { .. } => None,
        }
    }
}

/// Spreadsheet-callable function. Implementations are stateless and shared
/// across threads through the registry.
pub trait Function: Send + Sync + 'static {
    fn caps(&self) -> FnCaps {
        FnCaps::PURE
    }

    fn name(&self) -> &'static str;

    /// Index in the legacy binary function table, for functions that have one.
    fn biff_index(&self) -> Option<u16> {
        None
    }

    fn arity(&self) -> Arity;

    fn param_class(&self, _idx: usize) -> ParamClass {
        ParamClass::Value
    }

    fn volatile(&self) -> bool {
        self.caps().contains(FnCaps::VOLATILE)
    }

    /// Scalar path; every function has one.
    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        ctx: &dyn FunctionContext,
    ) -> Result<Value, ErrorCode>;

    /// Array-aware path. `None` means "not supported, fall back".
    fn eval_array<'a, 'b>(
        &self,
        _args: &'a [ArgumentHandle<'a, 'b>],
        _ctx: &dyn FunctionContext,
    ) -> Option<Result<Value, ErrorCode>> {
        None
    }

    /// Pick the array-aware path when an argument holds an array or a
    /// multi-cell area (or the caller runs in array context), otherwise the
    /// scalar path. Errors and non-finite numbers come back as error values.
    fn dispatch<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        ctx: &dyn FunctionContext,
    ) -> Value {
        let array_shaped = ctx.array_context() || args.iter().any(|a| a.is_array_like());
        if array_shaped {
            if let Some(result) = self.eval_array(args, ctx) {
                return finish(result);
            }
        }
        finish(self.eval(args, ctx))
    }
}

pub(crate) fn finish(result: Result<Value, ErrorCode>) -> Value {
    match result {
        Ok(v) => v.sanitized(),
        Err(e) => Value::Error(e),
    }
}
