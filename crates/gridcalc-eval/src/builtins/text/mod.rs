mod len_left_right;
mod mid_sub_replace;
mod trim_case_concat;
mod value_text;

pub use len_left_right::*;
pub use mid_sub_replace::*;
pub use trim_case_concat::*;
pub use value_text::*;

use crate::function_registry::FunctionRegistry;
use crate::register_functions;

pub fn register_builtins(registry: &mut FunctionRegistry) {
    register_functions!(registry;
        LenFn, LeftFn, RightFn,
        MidFn, SubstituteFn, ReplaceFn,
        TrimFn, UpperFn, LowerFn, ConcatenateFn, ExactFn, ReptFn,
        ValueFn
    );
}
