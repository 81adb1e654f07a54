pub mod datetime;
pub mod info;
pub mod logical;
pub mod math;
pub mod reference_fns;
pub mod stats;
pub mod text;
pub(crate) mod utils;

use crate::function_registry::FunctionRegistry;

pub fn load_builtins(registry: &mut FunctionRegistry) {
    logical::register_builtins(registry);
    info::register_builtins(registry);
    math::register_builtins(registry);
    text::register_builtins(registry);
    stats::register_builtins(registry);
    datetime::register_builtins(registry);
    reference_fns::register_builtins(registry);
}
